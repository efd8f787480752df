//! reqwest-backed implementation of [`DeedsApi`].

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{
    EntryRef, ErrorBody, ExportFormat, ExportRequest, ExportedDocument, JobId, JobStatusResponse,
    RecordId, RemoveGroupRequest, RemoveSelectedRequest, RemoveSelectedResponse, SaveResponse,
    SaveSelectedRequest, SavedGroup, SearchQuery, SearchResponse, SelectedRowsRequest,
    SelectedRowsResponse, SelectionId, TablesResponse, UploadAccepted, UploadFile,
};
use super::DeedsApi;
use crate::config::ClientConfig;
use crate::error::ClientError;

static RE_FILENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"filename="?([^";]+)"?"#).unwrap());

/// Extracts the download filename from a `Content-Disposition` header value.
pub fn parse_content_disposition(value: &str) -> Option<String> {
    RE_FILENAME
        .captures(value)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}

/// HTTP client for the document-search backend.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base: String,
    auth_token: Option<String>,
}

impl HttpApi {
    /// Creates a client with the configured timeouts and bearer token.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ClientError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base: config.api_base.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        let raw = format!("{}{}", self.base, path);
        Url::parse(&raw)
            .map_err(|e| ClientError::validation(format!("Invalid API URL '{}': {}", raw, e)))
    }

    /// Full `GET /search` URL for `query`, form-encoded in parameter order.
    pub fn search_url(&self, query: &SearchQuery) -> Result<Url, ClientError> {
        let mut url = self.endpoint("/search")?;
        if !query.pairs().is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.pairs().iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        self.authorize(request).send().await.map_err(ClientError::from)
    }
}

/// Maps non-success statuses to business errors and decodes the JSON body.
async fn read_json<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T, ClientError> {
    let response = check_status(response, fallback).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::transport(format!("Invalid response: {}", e)))
}

async fn check_status(response: Response, fallback: &str) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error);
    debug!(status = status.as_u16(), "Request failed: {}", body);
    Err(ClientError::business(status.as_u16(), message, fallback))
}

fn filename_from_headers(headers: &HeaderMap, format: ExportFormat) -> String {
    headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_disposition)
        .unwrap_or_else(|| format.default_filename().to_string())
}

#[async_trait]
impl DeedsApi for HttpApi {
    async fn upload(&self, table_name: &str, files: &[UploadFile]) -> Result<JobId, ClientError> {
        let mut form = Form::new().text("table_name", table_name.to_string());
        for file in files {
            form = form.part(
                "files",
                Part::bytes(file.bytes.clone()).file_name(file.name.clone()),
            );
        }

        debug!(table_name, files = files.len(), "Submitting upload");
        let response = self
            .send(self.client.post(self.endpoint("/upload")?).multipart(form))
            .await?;
        let accepted: UploadAccepted = read_json(response, "Upload failed").await?;
        Ok(accepted.job_id)
    }

    async fn upload_status(&self, job_id: &JobId) -> Result<JobStatusResponse, ClientError> {
        let url = self.endpoint(&format!("/upload/status/{}", job_id))?;
        let response = self.send(self.client.get(url)).await?;
        read_json(response, "Failed to read upload status").await
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, ClientError> {
        let url = self.search_url(query)?;
        debug!(%url, "Searching");
        let response = self.send(self.client.get(url)).await?;
        read_json(response, "Search failed").await
    }

    async fn tables(&self) -> Result<Vec<String>, ClientError> {
        let response = self.send(self.client.get(self.endpoint("/tables")?)).await?;
        let body: TablesResponse = read_json(response, "Failed to load tables").await?;
        Ok(body.tables)
    }

    async fn save_selected(&self, ids: &[RecordId]) -> Result<SaveResponse, ClientError> {
        let body = SaveSelectedRequest {
            entries: ids.iter().map(|&id| EntryRef { id }).collect(),
        };
        let response = self
            .send(self.client.post(self.endpoint("/api/save_selected")?).json(&body))
            .await?;
        read_json(response, "Failed to save entry").await
    }

    async fn selected_rows(&self, ids: &[RecordId]) -> Result<Vec<SavedGroup>, ClientError> {
        let body = SelectedRowsRequest { ids: ids.to_vec() };
        let response = self
            .send(self.client.post(self.endpoint("/api/selected_rows")?).json(&body))
            .await?;
        let body: SelectedRowsResponse =
            read_json(response, "Failed to load selected entries").await?;
        Ok(body.groups)
    }

    async fn remove_selected(&self, id: SelectionId) -> Result<bool, ClientError> {
        let body = RemoveSelectedRequest { id };
        let response = self
            .send(self.client.post(self.endpoint("/api/remove_selected")?).json(&body))
            .await?;
        let body: RemoveSelectedResponse = read_json(response, "Failed to remove entry").await?;
        Ok(body.is_deleted())
    }

    async fn remove_selected_group(&self, table_name: &str) -> Result<(), ClientError> {
        let body = RemoveGroupRequest { table_name };
        let response = self
            .send(
                self.client
                    .post(self.endpoint("/api/remove_selected_group")?)
                    .json(&body),
            )
            .await?;
        check_status(response, "Failed to remove group").await?;
        Ok(())
    }

    async fn export_selected(
        &self,
        format: ExportFormat,
        ids: &[RecordId],
        table_name: &str,
    ) -> Result<ExportedDocument, ClientError> {
        let body = ExportRequest {
            entries: ids.iter().map(|&id| EntryRef { id }).collect(),
            table_name,
        };
        let url = self.endpoint(&format!("/export/selected/{}", format.path_segment()))?;
        let response = self.send(self.client.post(url).json(&body)).await?;
        let response = check_status(response, "Export failed").await?;

        let filename = filename_from_headers(response.headers(), format);
        let bytes = response.bytes().await?;

        Ok(ExportedDocument {
            filename,
            bytes: bytes.to_vec(),
        })
    }
}
