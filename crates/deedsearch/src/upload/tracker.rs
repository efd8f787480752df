//! Submission and polling of ingestion jobs.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, info_span, warn, Instrument};

use super::job::{JobStatus, UploadJob};
use crate::api::{DeedsApi, JobId, UploadFile};
use crate::broadcast::Notifier;
use crate::error::ClientError;

pub const MSG_UPLOAD_COMPLETE: &str = "All files uploaded successfully!";
pub const MSG_CONNECTION_LOST: &str = "Connection lost";
pub const MSG_SERVER_NOT_RESPONDING: &str = "Server not responding";
pub const MSG_UPLOAD_FAILED: &str = "Upload failed";

/// Snapshot published to [`UploadJobTracker::subscribe`] receivers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobProgress {
    /// The current job, once the server accepted the submission.
    pub job: Option<UploadJob>,
    /// True from submission until the job reaches a terminal state or polling halts.
    pub uploading: bool,
}

impl JobProgress {
    pub fn processed(&self) -> u32 {
        self.job.as_ref().map(|j| j.processed_count).unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.job.as_ref().map(|j| j.total_files).unwrap_or(0)
    }

    pub fn status(&self) -> Option<JobStatus> {
        self.job.as_ref().map(|j| j.status)
    }

    pub fn status_text(&self) -> String {
        match &self.job {
            Some(job) => job.status_text(),
            None if self.uploading => "Uploading...".to_string(),
            None => String::new(),
        }
    }

    pub fn all_files_done(&self) -> bool {
        self.job.as_ref().is_some_and(UploadJob::all_files_done)
    }
}

/// Result of [`UploadJobTracker::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The server accepted the job and polling started.
    Started(JobId),
    /// Another submission is still in flight; nothing was sent.
    Ignored,
    /// [`UploadJobTracker::cancel`] ran while the upload was in flight. The
    /// accepted job is not polled.
    Cancelled(JobId),
}

/// Owns the lifecycle of one ingestion job at a time.
///
/// The poller is a tokio task; it stops on a terminal status, on the first
/// poll error, on [`cancel`](Self::cancel), on a new submission, and when the
/// tracker is dropped. Nothing is retried.
pub struct UploadJobTracker {
    api: Arc<dyn DeedsApi>,
    notifier: Notifier,
    poll_interval: Duration,
    uploading: Arc<AtomicBool>,
    /// Bumped by every submission and cancel; a submission whose number is
    /// stale when the server answers must not start polling.
    generation: AtomicU64,
    progress: Arc<watch::Sender<JobProgress>>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl UploadJobTracker {
    pub fn new(api: Arc<dyn DeedsApi>, notifier: Notifier, poll_interval: Duration) -> Self {
        let (progress, _) = watch::channel(JobProgress::default());
        Self {
            api,
            notifier,
            poll_interval,
            uploading: Arc::new(AtomicBool::new(false)),
            generation: AtomicU64::new(0),
            progress: Arc::new(progress),
            poller: Mutex::new(None),
        }
    }

    /// Validates and submits `files`, then starts polling the accepted job.
    ///
    /// Returns [`SubmitOutcome::Ignored`] without any request while a previous
    /// submission is still uploading.
    pub async fn submit(
        &self,
        table_name: &str,
        files: Vec<UploadFile>,
    ) -> Result<SubmitOutcome, ClientError> {
        let table_name = table_name.trim();
        if table_name.is_empty() {
            return Err(self.reject("Table name is required"));
        }
        if files.is_empty() {
            return Err(self.reject("Select at least one file to upload"));
        }

        if self.uploading.swap(true, Ordering::AcqRel) {
            debug!("Upload already in progress, ignoring submission");
            return Ok(SubmitOutcome::Ignored);
        }
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        self.stop_poller();
        self.progress.send_replace(JobProgress {
            job: None,
            uploading: true,
        });

        info!(table_name, files = files.len(), "Submitting upload");
        let job_id = match self.api.upload(table_name, &files).await {
            Ok(job_id) => job_id,
            Err(err) if !self.is_current(generation) => {
                debug!("Upload failed after cancel: {}", err);
                return Err(err);
            }
            Err(err) => {
                warn!("Upload submission failed: {}", err);
                self.uploading.store(false, Ordering::Release);
                self.progress.send_replace(JobProgress::default());
                self.notifier.error(&submission_message(&err));
                return Err(err);
            }
        };

        // Checked under the poller lock so a concurrent cancel either sees the
        // stored handle or makes this submission stale.
        let mut poller = self.poller.lock().unwrap_or_else(|p| p.into_inner());
        if !self.is_current(generation) {
            info!(job_id = %job_id, "Upload cancelled before polling started");
            return Ok(SubmitOutcome::Cancelled(job_id));
        }

        let job = UploadJob::new(
            job_id.clone(),
            table_name,
            files.iter().map(|f| f.name.clone()),
        );
        self.progress.send_replace(JobProgress {
            job: Some(job.clone()),
            uploading: true,
        });
        *poller = Some(self.spawn_poller(job));

        Ok(SubmitOutcome::Started(job_id))
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) == generation
    }

    fn reject(&self, message: &str) -> ClientError {
        self.notifier.error(message);
        ClientError::validation(message)
    }

    fn spawn_poller(&self, mut job: UploadJob) -> JoinHandle<()> {
        let api = Arc::clone(&self.api);
        let notifier = self.notifier.clone();
        let progress = Arc::clone(&self.progress);
        let uploading = Arc::clone(&self.uploading);
        let period = self.poll_interval;
        let span = info_span!("upload_poll", job_id = %job.job_id, table = %job.table_name);

        tokio::spawn(
            async move {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker.tick().await; // skip immediate first tick

                loop {
                    ticker.tick().await;

                    match api.upload_status(&job.job_id).await {
                        Ok(response) => {
                            job.apply(&response);
                            debug!("{}", job.status_text());

                            let terminal = job.status.is_terminal();
                            if terminal {
                                uploading.store(false, Ordering::Release);
                            }
                            progress.send_replace(JobProgress {
                                job: Some(job.clone()),
                                uploading: !terminal,
                            });

                            match job.status {
                                JobStatus::Done => {
                                    info!(files = job.total_files, "Upload job finished");
                                    notifier.success(MSG_UPLOAD_COMPLETE);
                                    break;
                                }
                                JobStatus::Failed => {
                                    let message = response
                                        .error
                                        .filter(|m| !m.trim().is_empty())
                                        .unwrap_or_else(|| MSG_UPLOAD_FAILED.to_string());
                                    warn!("Upload job failed: {}", message);
                                    notifier.error(&message);
                                    break;
                                }
                                _ => {}
                            }
                        }
                        Err(err) => {
                            warn!("Upload status poll failed: {}", err);
                            uploading.store(false, Ordering::Release);
                            progress.send_modify(|p| p.uploading = false);
                            if err.is_transport() {
                                notifier.error(MSG_CONNECTION_LOST);
                            } else {
                                notifier.error(&err.to_string());
                            }
                            break;
                        }
                    }
                }
            }
            .instrument(span),
        )
    }

    fn stop_poller(&self) {
        if let Ok(mut poller) = self.poller.lock() {
            if let Some(handle) = poller.take() {
                handle.abort();
            }
        }
    }

    /// Stops polling and returns the tracker to idle. The last job stays visible.
    ///
    /// A submission still waiting on the server is abandoned: its job is never
    /// polled.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.stop_poller();
        self.uploading.store(false, Ordering::Release);
        self.progress.send_modify(|p| p.uploading = false);
    }

    /// Current progress snapshot.
    pub fn progress(&self) -> JobProgress {
        self.progress.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<JobProgress> {
        self.progress.subscribe()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading.load(Ordering::Acquire)
    }

    pub fn all_files_done(&self) -> bool {
        self.progress.borrow().all_files_done()
    }

    /// Whether the caller may move on to searching the uploaded table.
    pub fn can_continue(&self) -> bool {
        !self.is_uploading() && self.all_files_done()
    }
}

impl Drop for UploadJobTracker {
    fn drop(&mut self) {
        self.stop_poller();
    }
}

fn submission_message(err: &ClientError) -> String {
    match err {
        ClientError::Transport(_) => MSG_SERVER_NOT_RESPONDING.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_message() {
        assert_eq!(
            submission_message(&ClientError::transport("refused")),
            MSG_SERVER_NOT_RESPONDING
        );
        assert_eq!(
            submission_message(&ClientError::business(400, None, MSG_UPLOAD_FAILED)),
            MSG_UPLOAD_FAILED
        );
        assert_eq!(
            submission_message(&ClientError::business(
                400,
                Some("Unsupported file type".into()),
                MSG_UPLOAD_FAILED
            )),
            "Unsupported file type"
        );
    }

    #[test]
    fn test_idle_progress() {
        let progress = JobProgress::default();
        assert_eq!(progress.processed(), 0);
        assert_eq!(progress.total(), 0);
        assert!(!progress.all_files_done());
        assert_eq!(progress.status_text(), "");

        let uploading = JobProgress {
            job: None,
            uploading: true,
        };
        assert_eq!(uploading.status_text(), "Uploading...");
    }
}
