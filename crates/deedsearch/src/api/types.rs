//! Wire types exchanged with the document-search backend.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ClientError;

/// Server identifier of a document row.
pub type RecordId = i64;

/// Server identifier of a saved ("selected") entry, distinct from the record it points at.
pub type SelectionId = i64;

/// Accepts strings, numbers and booleans as text; null and missing become `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

// ─── Upload ─────────────────────────────────────────────────────────────────

/// Opaque handle of a server-side ingestion job.
///
/// The backend encodes it as a JSON number today; strings are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        match Value::deserialize(deserializer)? {
            Value::String(s) if !s.is_empty() => Ok(JobId(s)),
            Value::Number(n) => Ok(JobId(n.to_string())),
            other => Err(D::Error::custom(format!("invalid job id: {}", other))),
        }
    }
}

/// One file blob handed to the upload endpoint.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Reads a file from disk, naming the blob after the file name.
    pub async fn from_path(path: &Path) -> Result<Self, ClientError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                ClientError::validation(format!("Invalid file path: {}", path.display()))
            })?;
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ClientError::validation(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(Self { name, bytes })
    }
}

/// Body of a successful `POST /upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadAccepted {
    pub job_id: JobId,
}

/// Job status as reported by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteJobStatus {
    Done,
    Failed,
    /// "running", "processing" or anything else non-terminal.
    #[default]
    #[serde(other)]
    Running,
}

impl RemoteJobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RemoteJobStatus::Done | RemoteJobStatus::Failed)
    }
}

/// Body of `GET /upload/status/{job_id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobStatusResponse {
    #[serde(default)]
    pub processed: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub status: RemoteJobStatus,
    #[serde(default)]
    pub error: Option<String>,
}

// ─── Search ─────────────────────────────────────────────────────────────────

/// One document row returned by the search endpoint.
///
/// Unknown fields are kept in `extra` so persisted rows round-trip verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_string")]
    pub docno: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub docname: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub registrationdate: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sroname: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sellerparty: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub purchaserparty: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub propertydescription: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub areaname: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub consideration_amt: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Record {
    /// Display columns in table order: doc no, doc name, registration date,
    /// SRO, seller, purchaser, property description, area, amount.
    pub fn display_columns(&self) -> [&str; 9] {
        [
            self.docno.as_deref().unwrap_or(""),
            self.docname.as_deref().unwrap_or(""),
            self.registrationdate.as_deref().unwrap_or(""),
            self.sroname.as_deref().unwrap_or(""),
            self.sellerparty.as_deref().unwrap_or(""),
            self.purchaserparty.as_deref().unwrap_or(""),
            self.propertydescription.as_deref().unwrap_or(""),
            self.areaname.as_deref().unwrap_or(""),
            self.consideration_amt.as_deref().unwrap_or(""),
        ]
    }
}

/// A group-and-count summary of the current result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    #[serde(rename = "docname", default, deserialize_with = "lenient_label")]
    pub label: String,
    #[serde(default)]
    pub count: u64,
}

fn lenient_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

/// Body of `GET /search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<Record>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub groups: Vec<Facet>,
}

/// Ordered query-string parameters for `GET /search`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    params: Vec<(&'static str, String)>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `name=value` when `value` is non-empty after trimming.
    pub fn push_non_empty(&mut self, name: &'static str, value: &str) {
        if !value.trim().is_empty() {
            self.params.push((name, value.to_string()));
        }
    }

    pub fn push(&mut self, name: &'static str, value: impl ToString) {
        self.params.push((name, value.to_string()));
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TablesResponse {
    #[serde(default)]
    pub tables: Vec<String>,
}

// ─── Selected entries ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub(crate) struct EntryRef {
    pub id: RecordId,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SaveSelectedRequest {
    pub entries: Vec<EntryRef>,
}

/// Body of `POST /api/save_selected`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveResponse {
    /// Number of net-new saved entries.
    #[serde(default)]
    pub added: u64,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SelectedRowsRequest {
    pub ids: Vec<RecordId>,
}

/// A saved entry row as returned by `POST /api/selected_rows`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRow {
    pub sel_id: SelectionId,
    pub document_id: RecordId,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl SavedRow {
    /// Returns a field as display text; numbers are rendered, null is empty.
    pub fn field(&self, name: &str) -> String {
        match self.fields.get(name) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Saved entries of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedGroup {
    pub table_name: String,
    #[serde(default)]
    pub chip_label: String,
    #[serde(default)]
    pub rows: Vec<SavedRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SelectedRowsResponse {
    #[serde(default)]
    pub groups: Vec<SavedGroup>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RemoveSelectedRequest {
    pub id: SelectionId,
}

/// Body of `POST /api/remove_selected`. The backend answers with either a
/// boolean or the deleted id.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RemoveSelectedResponse {
    #[serde(default)]
    pub deleted: Value,
}

impl RemoveSelectedResponse {
    pub fn is_deleted(&self) -> bool {
        match &self.deleted {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
            Value::String(s) => !s.is_empty(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RemoveGroupRequest<'a> {
    pub table_name: &'a str,
}

// ─── Export ─────────────────────────────────────────────────────────────────

/// Document format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Excel,
    Word,
}

impl ExportFormat {
    pub fn path_segment(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "excel",
            ExportFormat::Word => "word",
        }
    }

    /// Filename used when the server does not name the download.
    pub fn default_filename(&self) -> &'static str {
        match self {
            ExportFormat::Excel => "download.xlsx",
            ExportFormat::Word => "download.docx",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "word" | "docx" => Ok(ExportFormat::Word),
            other => Err(ClientError::validation(format!(
                "Unknown export format: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ExportRequest<'a> {
    pub entries: Vec<EntryRef>,
    pub table_name: &'a str,
}

/// A downloaded export.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Error body shape shared by every endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
