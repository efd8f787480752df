//! Upload submission and polling against a scripted backend.
//!
//! Time is paused, so the 2 s poll interval elapses instantly whenever the
//! test task waits.

mod common;

use std::time::Duration;

use common::*;
use deedsearch::api::JobId;
use deedsearch::broadcast::NotificationLevel;
use deedsearch::error::ClientError;
use deedsearch::upload::{FileStatus, JobProgress, JobStatus, SubmitOutcome};

use FileStatus::{Done, Failed, Waiting};

fn statuses(progress: &JobProgress) -> Vec<FileStatus> {
    progress
        .job
        .as_ref()
        .map(|j| j.file_entries.iter().map(|e| e.status).collect())
        .unwrap_or_default()
}

#[tokio::test(start_paused = true)]
async fn deeds_2021_upload_transitions_and_stops() {
    let harness = TestHarness::new();
    harness.api.script_upload(Ok(JobId::new("42")));
    harness.api.script_status(Ok(running(1, 3)));
    harness.api.script_status(Ok(done(3, 3)));
    let mut notes = harness.notifications();

    let tracker = harness.tracker();
    let mut rx = tracker.subscribe();

    let outcome = tracker
        .submit(" deeds_2021 ", upload_files(&["a.pdf", "b.pdf", "c.pdf"]))
        .await
        .unwrap();
    assert_eq!(outcome, SubmitOutcome::Started(JobId::new("42")));
    assert_eq!(
        harness.api.calls()[0],
        Call::Upload {
            table_name: "deeds_2021".into(),
            files: vec!["a.pdf".into(), "b.pdf".into(), "c.pdf".into()],
        }
    );

    let mut seen = vec![statuses(&rx.borrow_and_update())];
    loop {
        rx.changed().await.unwrap();
        let progress = rx.borrow_and_update().clone();
        seen.push(statuses(&progress));
        if !progress.uploading {
            assert_eq!(progress.status(), Some(JobStatus::Done));
            assert_eq!(progress.status_text(), "Processed 3 / 3 files");
            break;
        }
    }

    assert_eq!(
        seen,
        vec![
            vec![Waiting, Waiting, Waiting],
            vec![Done, Waiting, Waiting],
            vec![Done, Done, Done],
        ]
    );

    // No further polls after the terminal response.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(harness.api.status_calls(), 2);

    assert!(tracker.all_files_done());
    assert!(tracker.can_continue());

    let notes = drain(&mut notes);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Success);
    assert_eq!(notes[0].message, "All files uploaded successfully!");
}

#[tokio::test(start_paused = true)]
async fn progress_is_monotonic_and_bounded() {
    let harness = TestHarness::new();
    for processed in [0, 1, 1, 2, 4, 4] {
        harness.api.script_status(Ok(running(processed, 5)));
    }
    harness.api.script_status(Ok(done(5, 5)));

    let tracker = harness.tracker();
    let mut rx = tracker.subscribe();
    tracker
        .submit("deeds", upload_files(&["1", "2", "3", "4", "5"]))
        .await
        .unwrap();

    let mut last_done = 0;
    loop {
        rx.changed().await.unwrap();
        let progress = rx.borrow_and_update().clone();
        let done = statuses(&progress).iter().filter(|s| **s == Done).count();
        assert!(done >= last_done);
        assert!(done as u32 <= progress.total());
        last_done = done;
        if !progress.uploading {
            break;
        }
    }
    assert_eq!(last_done, 5);
}

#[tokio::test(start_paused = true)]
async fn blank_table_or_no_files_is_rejected_without_request() {
    let harness = TestHarness::new();
    let mut notes = harness.notifications();
    let tracker = harness.tracker();

    let err = tracker
        .submit("   ", upload_files(&["a.pdf"]))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));

    let err = tracker.submit("deeds", Vec::new()).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));

    assert_eq!(harness.api.total_calls(), 0);
    assert!(!tracker.is_uploading());
    assert_eq!(drain(&mut notes).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn reentrant_submit_is_ignored() {
    let harness = TestHarness::new();
    let tracker = harness.tracker();

    let first = tracker
        .submit("deeds", upload_files(&["a.pdf"]))
        .await
        .unwrap();
    assert!(matches!(first, SubmitOutcome::Started(_)));

    let second = tracker
        .submit("deeds", upload_files(&["b.pdf"]))
        .await
        .unwrap();
    assert_eq!(second, SubmitOutcome::Ignored);
    assert_eq!(harness.api.upload_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn business_error_at_submission_resets_to_idle() {
    let harness = TestHarness::new();
    harness.api.script_upload(Err(ClientError::business(
        400,
        Some("Table deeds_2021 already exists".into()),
        "Upload failed",
    )));
    let mut notes = harness.notifications();
    let tracker = harness.tracker();

    let err = tracker
        .submit("deeds_2021", upload_files(&["a.pdf"]))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Table deeds_2021 already exists");
    assert!(!tracker.is_uploading());
    assert!(tracker.progress().job.is_none());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(harness.api.status_calls(), 0);

    let notes = drain(&mut notes);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].message, "Table deeds_2021 already exists");
}

#[tokio::test(start_paused = true)]
async fn transport_error_at_submission_reports_server_not_responding() {
    let harness = TestHarness::new();
    harness
        .api
        .script_upload(Err(ClientError::transport("connection refused")));
    let mut notes = harness.notifications();
    let tracker = harness.tracker();

    assert!(tracker
        .submit("deeds", upload_files(&["a.pdf"]))
        .await
        .is_err());

    let notes = drain(&mut notes);
    assert_eq!(notes[0].message, "Server not responding");
    assert_eq!(notes[0].level, NotificationLevel::Error);
}

#[tokio::test(start_paused = true)]
async fn transport_error_while_polling_halts_without_retry() {
    let harness = TestHarness::new();
    harness.api.script_status(Ok(running(1, 2)));
    harness
        .api
        .script_status(Err(ClientError::transport("connection reset")));
    let mut notes = harness.notifications();

    let tracker = harness.tracker();
    let mut rx = tracker.subscribe();
    tracker
        .submit("deeds", upload_files(&["a.pdf", "b.pdf"]))
        .await
        .unwrap();

    rx.wait_for(|p| !p.uploading).await.unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(harness.api.status_calls(), 2);
    assert!(!tracker.is_uploading());
    assert!(!tracker.can_continue());
    assert_eq!(tracker.progress().processed(), 1);

    let messages: Vec<String> = drain(&mut notes).into_iter().map(|n| n.message).collect();
    assert_eq!(messages, vec!["Connection lost".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn server_failure_is_terminal() {
    let harness = TestHarness::new();
    harness
        .api
        .script_status(Ok(failed(1, 3, "Could not parse c.pdf")));
    let mut notes = harness.notifications();

    let tracker = harness.tracker();
    let mut rx = tracker.subscribe();
    tracker
        .submit("deeds", upload_files(&["a.pdf", "b.pdf", "c.pdf"]))
        .await
        .unwrap();

    let progress = rx.wait_for(|p| !p.uploading).await.unwrap().clone();
    assert_eq!(progress.status(), Some(JobStatus::Failed));
    assert_eq!(statuses(&progress), vec![Done, Failed, Failed]);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(harness.api.status_calls(), 1);

    let notes = drain(&mut notes);
    assert_eq!(notes[0].message, "Could not parse c.pdf");
    assert_eq!(notes[0].level, NotificationLevel::Error);
}

#[tokio::test(start_paused = true)]
async fn dropping_tracker_stops_polling() {
    let harness = TestHarness::new();
    let tracker = harness.tracker();
    tracker
        .submit("deeds", upload_files(&["a.pdf"]))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    let polls = harness.api.status_calls();
    assert!(polls >= 1);

    drop(tracker);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(harness.api.status_calls(), polls);
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_polling_and_allows_resubmission() {
    let harness = TestHarness::new();
    let tracker = harness.tracker();
    tracker
        .submit("deeds", upload_files(&["a.pdf"]))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(3)).await;
    tracker.cancel();
    let polls = harness.api.status_calls();
    assert!(!tracker.is_uploading());

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(harness.api.status_calls(), polls);

    let again = tracker
        .submit("deeds", upload_files(&["b.pdf"]))
        .await
        .unwrap();
    assert!(matches!(again, SubmitOutcome::Started(_)));
    assert_eq!(harness.api.upload_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_submission_never_polls_the_job() {
    let harness = TestHarness::new();
    let release = harness.api.script_gated_upload(Ok(JobId::new("job0")));
    let tracker = harness.tracker();

    let (outcome, ()) = tokio::join!(
        tracker.submit("deeds", upload_files(&["a.pdf"])),
        async {
            assert!(tracker.is_uploading());
            tracker.cancel();
            release.send(()).unwrap();
        }
    );
    assert_eq!(outcome.unwrap(), SubmitOutcome::Cancelled(JobId::new("job0")));
    assert!(!tracker.is_uploading());
    assert!(tracker.progress().job.is_none());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(harness.api.status_calls(), 0);

    let again = tracker
        .submit("deeds", upload_files(&["b.pdf"]))
        .await
        .unwrap();
    assert_eq!(again, SubmitOutcome::Started(JobId::new("1")));
    assert_eq!(harness.api.upload_calls(), 2);
}
