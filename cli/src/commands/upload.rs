//! `deedsearch upload`: submit files and follow the ingestion job.

use std::path::PathBuf;

use tracing::info;

use deedsearch::api::UploadFile;
use deedsearch::upload::{FileStatus, SubmitOutcome};

use crate::state::{flush_notifications, AppState};

pub async fn run(state: &AppState, table: &str, paths: &[PathBuf]) -> deedsearch::Result<()> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(UploadFile::from_path(path).await?);
    }

    let mut notes = state.notifications();
    let tracker = state.tracker();
    let mut progress = tracker.subscribe();

    let submitted = tracker.submit(table, files).await;
    flush_notifications(&mut notes);
    match submitted? {
        SubmitOutcome::Started(job_id) => info!(%job_id, "Upload accepted"),
        SubmitOutcome::Ignored | SubmitOutcome::Cancelled(_) => return Ok(()),
    }

    let mut last_text = String::new();
    while progress.changed().await.is_ok() {
        let snapshot = progress.borrow_and_update().clone();
        let text = snapshot.status_text();
        if text != last_text {
            println!("{}", text);
            last_text = text;
        }
        if !snapshot.uploading {
            if let Some(job) = &snapshot.job {
                for entry in &job.file_entries {
                    let mark = match entry.status {
                        FileStatus::Done => "done",
                        FileStatus::Waiting => "waiting",
                        FileStatus::Failed => "failed",
                    };
                    match &entry.error {
                        Some(error) => println!("  {:<8} {} ({})", mark, entry.name, error),
                        None => println!("  {:<8} {}", mark, entry.name),
                    }
                }
            }
            break;
        }
    }

    flush_notifications(&mut notes);
    if tracker.can_continue() {
        println!("Search the new entries with: deedsearch search --table {}", table.trim());
    }
    Ok(())
}
