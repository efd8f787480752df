//! Client-side model of one ingestion job.

use serde::{Deserialize, Serialize};

use crate::api::{JobId, JobStatusResponse, RemoteJobStatus};

/// Lifecycle state of an [`UploadJob`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted by the server, no status observed yet.
    #[default]
    Pending,
    Running,
    Done,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "Pending"),
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Done => write!(f, "Done"),
            JobStatus::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Waiting,
    Done,
    Failed,
}

/// Per-file view of a job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileEntry {
    pub fn waiting(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: FileStatus::Waiting,
            error: None,
        }
    }
}

/// An accepted ingestion job and its last observed progress.
///
/// The server only reports a scalar `processed` count, so per-file state is
/// projected by position: the first `processed_count` entries in submission
/// order are marked done regardless of which file the server finished. Use
/// `processed_count` / `total_files` when the aggregate is what matters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadJob {
    pub job_id: JobId,
    pub table_name: String,
    pub total_files: u32,
    pub processed_count: u32,
    pub status: JobStatus,
    pub file_entries: Vec<FileEntry>,
}

impl UploadJob {
    /// Creates a pending job with every file waiting, in submission order.
    pub fn new<I, S>(job_id: JobId, table_name: &str, file_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let file_entries: Vec<FileEntry> = file_names.into_iter().map(FileEntry::waiting).collect();
        Self {
            job_id,
            table_name: table_name.to_string(),
            total_files: file_entries.len() as u32,
            processed_count: 0,
            status: JobStatus::Pending,
            file_entries,
        }
    }

    /// Folds one status poll into the job.
    ///
    /// The total never drops below the number of submitted files, and a done
    /// job counts every entry as processed.
    pub fn apply(&mut self, response: &JobStatusResponse) {
        let submitted = self.file_entries.len() as u32;
        if response.total > 0 {
            self.total_files = response.total.max(submitted);
        }
        self.processed_count = match response.status {
            RemoteJobStatus::Done => self.total_files,
            _ => response.processed.min(self.total_files),
        };

        let done = (self.processed_count as usize).min(self.file_entries.len());
        for (index, entry) in self.file_entries.iter_mut().enumerate() {
            if index < done {
                entry.status = FileStatus::Done;
                entry.error = None;
            } else {
                entry.status = FileStatus::Waiting;
            }
        }

        self.status = match response.status {
            RemoteJobStatus::Done => JobStatus::Done,
            RemoteJobStatus::Running => JobStatus::Running,
            RemoteJobStatus::Failed => {
                for entry in self.file_entries.iter_mut().skip(done) {
                    entry.status = FileStatus::Failed;
                    entry.error = response.error.clone();
                }
                JobStatus::Failed
            }
        };
    }

    pub fn status_text(&self) -> String {
        format!("Processed {} / {} files", self.processed_count, self.total_files)
    }

    pub fn done_count(&self) -> usize {
        self.file_entries
            .iter()
            .filter(|e| e.status == FileStatus::Done)
            .count()
    }

    /// True when there is at least one entry and every entry is done.
    pub fn all_files_done(&self) -> bool {
        !self.file_entries.is_empty()
            && self
                .file_entries
                .iter()
                .all(|e| e.status == FileStatus::Done)
    }
}
