//! Scripted backend and test harness.
//!
//! `FakeApi` answers from per-endpoint queues and falls back to a neutral
//! default when a queue is empty. Uploads, searches and saves can be gated on a
//! oneshot so tests control the order in which overlapping requests complete.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::{broadcast, oneshot};

use deedsearch::api::{
    DeedsApi, ExportFormat, ExportedDocument, JobId, JobStatusResponse, RecordId, SaveResponse,
    SavedGroup, SearchQuery, SearchResponse, SelectionId, UploadFile,
};
use deedsearch::broadcast::{Notification, Notifier};
use deedsearch::error::ClientError;
use deedsearch::search::SearchSessionController;
use deedsearch::selection::{SavedEntries, SelectionCache};
use deedsearch::store::{MemoryStore, SessionStore, SqliteStore};
use deedsearch::upload::UploadJobTracker;

/// One request seen by the fake backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upload { table_name: String, files: Vec<String> },
    UploadStatus(JobId),
    Search(SearchQuery),
    Tables,
    SaveSelected(Vec<RecordId>),
    SelectedRows(Vec<RecordId>),
    RemoveSelected(SelectionId),
    RemoveSelectedGroup(String),
    Export {
        format: ExportFormat,
        ids: Vec<RecordId>,
        table_name: String,
    },
}

/// A scripted answer, optionally held back until its gate fires.
struct Gated<T> {
    gate: Option<oneshot::Receiver<()>>,
    result: Result<T, ClientError>,
}

impl<T> Gated<T> {
    fn ready(result: Result<T, ClientError>) -> Self {
        Self { gate: None, result }
    }

    fn gated(result: Result<T, ClientError>) -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { gate: Some(rx), result })
    }

    async fn resolve(self) -> Result<T, ClientError> {
        if let Some(gate) = self.gate {
            let _ = gate.await;
        }
        self.result
    }
}

#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<Call>>,
    uploads: Mutex<VecDeque<Gated<JobId>>>,
    statuses: Mutex<VecDeque<Result<JobStatusResponse, ClientError>>>,
    searches: Mutex<VecDeque<Gated<SearchResponse>>>,
    default_search: Mutex<SearchResponse>,
    saves: Mutex<VecDeque<Gated<SaveResponse>>>,
    saved_groups: Mutex<Vec<SavedGroup>>,
    tables: Mutex<Vec<String>>,
    exports: Mutex<VecDeque<Result<ExportedDocument, ClientError>>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    // ─── scripting ──────────────────────────────────────────────────────────

    pub fn script_upload(&self, result: Result<JobId, ClientError>) {
        self.uploads.lock().unwrap().push_back(Gated::ready(result));
    }

    /// Scripts an upload that only answers once the returned sender fires.
    pub fn script_gated_upload(&self, result: Result<JobId, ClientError>) -> oneshot::Sender<()> {
        let (tx, scripted) = Gated::gated(result);
        self.uploads.lock().unwrap().push_back(scripted);
        tx
    }

    pub fn script_status(&self, result: Result<JobStatusResponse, ClientError>) {
        self.statuses.lock().unwrap().push_back(result);
    }

    pub fn script_search(&self, result: Result<SearchResponse, ClientError>) {
        self.searches.lock().unwrap().push_back(Gated::ready(result));
    }

    /// Scripts a search that only answers once the returned sender fires.
    pub fn script_gated_search(&self, response: SearchResponse) -> oneshot::Sender<()> {
        let (tx, scripted) = Gated::gated(Ok(response));
        self.searches.lock().unwrap().push_back(scripted);
        tx
    }

    /// Response used when no search is scripted.
    pub fn set_default_search(&self, response: SearchResponse) {
        *self.default_search.lock().unwrap() = response;
    }

    pub fn script_save(&self, result: Result<SaveResponse, ClientError>) {
        self.saves.lock().unwrap().push_back(Gated::ready(result));
    }

    /// Scripts a save that only answers once the returned sender fires.
    pub fn script_gated_save(&self, result: Result<SaveResponse, ClientError>) -> oneshot::Sender<()> {
        let (tx, scripted) = Gated::gated(result);
        self.saves.lock().unwrap().push_back(scripted);
        tx
    }

    pub fn set_saved_groups(&self, groups: Vec<SavedGroup>) {
        *self.saved_groups.lock().unwrap() = groups;
    }

    pub fn set_tables(&self, tables: &[&str]) {
        *self.tables.lock().unwrap() = tables.iter().map(|t| t.to_string()).collect();
    }

    pub fn script_export(&self, result: Result<ExportedDocument, ClientError>) {
        self.exports.lock().unwrap().push_back(result);
    }

    // ─── inspection ─────────────────────────────────────────────────────────

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matches(c)).count()
    }

    pub fn upload_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Upload { .. }))
    }

    pub fn status_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::UploadStatus(_)))
    }

    pub fn search_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Search(_)))
    }

    pub fn save_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::SaveSelected(_)))
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Query of the most recent search request.
    pub fn last_search(&self) -> Option<SearchQuery> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|c| match c {
                Call::Search(query) => Some(query.clone()),
                _ => None,
            })
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DeedsApi for FakeApi {
    async fn upload(&self, table_name: &str, files: &[UploadFile]) -> Result<JobId, ClientError> {
        self.record(Call::Upload {
            table_name: table_name.to_string(),
            files: files.iter().map(|f| f.name.clone()).collect(),
        });
        let scripted = self.uploads.lock().unwrap().pop_front();
        match scripted {
            Some(scripted) => scripted.resolve().await,
            None => Ok(JobId::new("1")),
        }
    }

    async fn upload_status(&self, job_id: &JobId) -> Result<JobStatusResponse, ClientError> {
        self.record(Call::UploadStatus(job_id.clone()));
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(JobStatusResponse::default()))
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, ClientError> {
        self.record(Call::Search(query.clone()));
        let scripted = self.searches.lock().unwrap().pop_front();
        let Some(scripted) = scripted else {
            let response = self.default_search.lock().unwrap().clone();
            return Ok(response);
        };
        scripted.resolve().await
    }

    async fn tables(&self) -> Result<Vec<String>, ClientError> {
        self.record(Call::Tables);
        Ok(self.tables.lock().unwrap().clone())
    }

    async fn save_selected(&self, ids: &[RecordId]) -> Result<SaveResponse, ClientError> {
        self.record(Call::SaveSelected(ids.to_vec()));
        let scripted = self.saves.lock().unwrap().pop_front();
        match scripted {
            Some(scripted) => scripted.resolve().await,
            None => Ok(SaveResponse { added: 1 }),
        }
    }

    async fn selected_rows(&self, ids: &[RecordId]) -> Result<Vec<SavedGroup>, ClientError> {
        self.record(Call::SelectedRows(ids.to_vec()));
        Ok(self.saved_groups.lock().unwrap().clone())
    }

    async fn remove_selected(&self, id: SelectionId) -> Result<bool, ClientError> {
        self.record(Call::RemoveSelected(id));
        let mut groups = self.saved_groups.lock().unwrap();
        let mut deleted = false;
        for group in groups.iter_mut() {
            let before = group.rows.len();
            group.rows.retain(|r| r.sel_id != id);
            deleted |= group.rows.len() != before;
        }
        groups.retain(|g| !g.rows.is_empty());
        Ok(deleted)
    }

    async fn remove_selected_group(&self, table_name: &str) -> Result<(), ClientError> {
        self.record(Call::RemoveSelectedGroup(table_name.to_string()));
        self.saved_groups
            .lock()
            .unwrap()
            .retain(|g| g.table_name != table_name);
        Ok(())
    }

    async fn export_selected(
        &self,
        format: ExportFormat,
        ids: &[RecordId],
        table_name: &str,
    ) -> Result<ExportedDocument, ClientError> {
        self.record(Call::Export {
            format,
            ids: ids.to_vec(),
            table_name: table_name.to_string(),
        });
        self.exports.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(ExportedDocument {
                filename: format.default_filename().to_string(),
                bytes: vec![0x50, 0x4b, 0x03, 0x04],
            })
        })
    }
}

/// Isolated environment: fake backend, session store, durable store on disk.
pub struct TestHarness {
    _temp_dir: TempDir,
    pub api: Arc<FakeApi>,
    pub notifier: Notifier,
    pub session: Arc<MemoryStore>,
    pub preferences: Arc<SqliteStore>,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let preferences =
            Arc::new(SqliteStore::open(temp_dir.path()).expect("Failed to open preference store"));
        Self {
            _temp_dir: temp_dir,
            api: FakeApi::new(),
            notifier: Notifier::default(),
            session: Arc::new(MemoryStore::new()),
            preferences,
        }
    }

    pub fn api(&self) -> Arc<dyn DeedsApi> {
        self.api.clone()
    }

    pub fn controller(&self) -> SearchSessionController {
        let session: Arc<dyn SessionStore> = self.session.clone();
        let preferences: Arc<dyn SessionStore> = self.preferences.clone();
        SearchSessionController::new(self.api(), session, self.notifier.clone())
            .with_preferences(preferences)
    }

    pub fn tracker(&self) -> UploadJobTracker {
        UploadJobTracker::new(self.api(), self.notifier.clone(), Duration::from_secs(2))
    }

    pub fn selection_cache(&self) -> SelectionCache {
        SelectionCache::new(self.api(), self.notifier.clone())
    }

    pub fn saved_entries(&self) -> SavedEntries {
        SavedEntries::new(self.api(), self.notifier.clone())
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }
}

/// Drains every notification received so far.
pub fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}
