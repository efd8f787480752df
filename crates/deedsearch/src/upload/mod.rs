//! Upload job tracking.

pub mod job;
pub mod tracker;

pub use job::{FileEntry, FileStatus, JobStatus, UploadJob};
pub use tracker::{JobProgress, SubmitOutcome, UploadJobTracker};
