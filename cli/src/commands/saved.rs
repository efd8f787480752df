//! `deedsearch saved` and `deedsearch export`: manage saved entries.

use std::path::Path;

use tracing::info;

use deedsearch::api::{ExportFormat, RecordId, SelectionId};
use deedsearch::selection::MarkOutcome;

use crate::state::{flush_notifications, AppState};

pub async fn list(state: &AppState) -> deedsearch::Result<()> {
    let mut notes = state.notifications();
    let mut saved = state.saved_entries();
    let loaded = saved.load().await.map(|groups| groups.to_vec());
    flush_notifications(&mut notes);

    let groups = loaded?;
    println!("{} Tables Available", groups.len());
    for group in &groups {
        println!("{} ({} entries)", group.chip_label, group.rows.len());
        for row in &group.rows {
            println!(
                "  sel:{:<6} doc:{:<8} {} | {}",
                row.sel_id,
                row.document_id,
                row.field("docno"),
                row.field("docname")
            );
        }
    }
    Ok(())
}

pub async fn add(state: &AppState, id: RecordId) -> deedsearch::Result<()> {
    let mut notes = state.notifications();
    let cache = state.selection_cache();
    let result = async {
        cache.initialize().await?;
        cache.mark_saved(id).await
    }
    .await;
    flush_notifications(&mut notes);

    match result? {
        MarkOutcome::AlreadySaved => println!("Entry {} is already saved", id),
        MarkOutcome::Added => {}
        MarkOutcome::NotAdded => println!("Server did not add entry {}", id),
        MarkOutcome::Pending => println!("Entry {} is already being saved", id),
    }
    Ok(())
}

pub async fn remove(state: &AppState, sel_id: SelectionId, table: &str) -> deedsearch::Result<()> {
    let mut notes = state.notifications();
    let mut saved = state.saved_entries();
    let result = async {
        saved.load().await?;
        saved.remove_row(sel_id, table).await
    }
    .await;
    flush_notifications(&mut notes);

    if !result? {
        println!("Nothing removed");
    }
    Ok(())
}

pub async fn remove_group(state: &AppState, table: &str) -> deedsearch::Result<()> {
    let mut notes = state.notifications();
    let mut saved = state.saved_entries();
    let result = saved.remove_group(table).await;
    flush_notifications(&mut notes);
    Ok(result?)
}

pub async fn copy(state: &AppState, table: &str) -> deedsearch::Result<()> {
    let mut saved = state.saved_entries();
    saved.load().await?;
    println!("{}", saved.copy_text(table)?);
    Ok(())
}

pub async fn export(
    state: &AppState,
    table: &str,
    format: ExportFormat,
    output_dir: &Path,
) -> deedsearch::Result<()> {
    let mut notes = state.notifications();
    let mut saved = state.saved_entries();
    let result = async {
        saved.load().await?;
        saved.export(table, format).await
    }
    .await;
    flush_notifications(&mut notes);
    let document = result?;

    // The server controls the name; keep only the final component.
    let filename = Path::new(&document.filename)
        .file_name()
        .map(|n| n.to_owned())
        .unwrap_or_else(|| format.default_filename().into());
    let path = output_dir.join(filename);
    tokio::fs::write(&path, &document.bytes).await?;

    info!(path = %path.display(), bytes = document.bytes.len(), "Export written");
    println!("{}", path.display());
    Ok(())
}
