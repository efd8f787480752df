//! Transport seam between the session components and the backend.
//!
//! Components talk to [`DeedsApi`] only, so they can be driven by the
//! reqwest-backed [`HttpApi`] in production and by scripted fakes in tests.

pub mod http;
pub mod types;

use async_trait::async_trait;

use crate::error::ClientError;

pub use http::{parse_content_disposition, HttpApi};
pub use types::{
    ExportFormat, ExportedDocument, Facet, JobId, JobStatusResponse, Record, RecordId,
    RemoteJobStatus, SaveResponse, SavedGroup, SavedRow, SearchQuery, SearchResponse,
    SelectionId, UploadFile,
};

#[async_trait]
pub trait DeedsApi: Send + Sync {
    /// `POST /upload`: starts an ingestion job.
    async fn upload(&self, table_name: &str, files: &[UploadFile]) -> Result<JobId, ClientError>;

    /// `GET /upload/status/{job_id}`.
    async fn upload_status(&self, job_id: &JobId) -> Result<JobStatusResponse, ClientError>;

    /// `GET /search`.
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, ClientError>;

    /// `GET /tables`.
    async fn tables(&self) -> Result<Vec<String>, ClientError>;

    /// `POST /api/save_selected`.
    async fn save_selected(&self, ids: &[RecordId]) -> Result<SaveResponse, ClientError>;

    /// `POST /api/selected_rows`. An empty `ids` slice fetches every saved entry.
    async fn selected_rows(&self, ids: &[RecordId]) -> Result<Vec<SavedGroup>, ClientError>;

    /// `POST /api/remove_selected`. Returns whether the server deleted the entry.
    async fn remove_selected(&self, id: SelectionId) -> Result<bool, ClientError>;

    /// `POST /api/remove_selected_group`.
    async fn remove_selected_group(&self, table_name: &str) -> Result<(), ClientError>;

    /// `POST /export/selected/{excel|word}`.
    async fn export_selected(
        &self,
        format: ExportFormat,
        ids: &[RecordId],
        table_name: &str,
    ) -> Result<ExportedDocument, ClientError>;
}
