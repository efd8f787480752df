//! Saved ("selected") entries grouped by table, with removal and export.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::{DeedsApi, ExportFormat, ExportedDocument, SavedGroup, SelectionId};
use crate::broadcast::Notifier;
use crate::error::ClientError;

pub struct SavedEntries {
    api: Arc<dyn DeedsApi>,
    notifier: Notifier,
    groups: Vec<SavedGroup>,
    active: Option<String>,
}

impl SavedEntries {
    pub fn new(api: Arc<dyn DeedsApi>, notifier: Notifier) -> Self {
        Self {
            api,
            notifier,
            groups: Vec::new(),
            active: None,
        }
    }

    /// Fetches every saved entry. On failure the view is emptied.
    pub async fn load(&mut self) -> Result<&[SavedGroup], ClientError> {
        match self.api.selected_rows(&[]).await {
            Ok(groups) => {
                debug!(groups = groups.len(), "Loaded saved entries");
                self.groups = groups;
                if let Some(active) = &self.active {
                    if !self.groups.iter().any(|g| &g.table_name == active) {
                        self.active = None;
                    }
                }
                Ok(&self.groups)
            }
            Err(err) => {
                warn!("Failed to load saved entries: {}", err);
                self.groups.clear();
                self.active = None;
                self.notifier.error("Failed to load selected entries");
                Err(err)
            }
        }
    }

    pub fn groups(&self) -> &[SavedGroup] {
        &self.groups
    }

    pub fn group(&self, table_name: &str) -> Option<&SavedGroup> {
        self.groups.iter().find(|g| g.table_name == table_name)
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_group(&self) -> Option<&SavedGroup> {
        self.active.as_deref().and_then(|t| self.group(t))
    }

    /// Opens `table_name`, or closes it when it is already open.
    pub fn toggle_active(&mut self, table_name: &str) -> Option<&str> {
        if self.active.as_deref() == Some(table_name) {
            self.active = None;
        } else {
            self.active = Some(table_name.to_string());
        }
        self.active.as_deref()
    }

    /// Removes one saved entry. Returns whether the server deleted it.
    pub async fn remove_row(
        &mut self,
        sel_id: SelectionId,
        table_name: &str,
    ) -> Result<bool, ClientError> {
        let deleted = match self.api.remove_selected(sel_id).await {
            Ok(deleted) => deleted,
            Err(err) => {
                warn!(sel_id, "Failed to remove entry: {}", err);
                self.notifier.error("Failed to remove entry");
                return Err(err);
            }
        };
        if !deleted {
            return Ok(false);
        }

        for group in self.groups.iter_mut().filter(|g| g.table_name == table_name) {
            group.rows.retain(|r| r.sel_id != sel_id);
        }
        self.groups.retain(|g| !g.rows.is_empty());
        if self.active.as_deref() == Some(table_name) && self.group(table_name).is_none() {
            self.active = None;
        }

        self.notifier.success("Entry removed");
        Ok(true)
    }

    /// Removes every saved entry of `table_name`.
    pub async fn remove_group(&mut self, table_name: &str) -> Result<(), ClientError> {
        if let Err(err) = self.api.remove_selected_group(table_name).await {
            warn!(table_name, "Failed to remove group: {}", err);
            self.notifier.error("Failed to remove group");
            return Err(err);
        }

        self.groups.retain(|g| g.table_name != table_name);
        if self.active.as_deref() == Some(table_name) {
            self.active = None;
        }
        self.notifier.success("Group removed");
        Ok(())
    }

    /// Downloads the entries of `table_name` as an Excel or Word document.
    pub async fn export(
        &self,
        table_name: &str,
        format: ExportFormat,
    ) -> Result<ExportedDocument, ClientError> {
        let ids: Vec<_> = self
            .group(table_name)
            .map(|g| g.rows.iter().map(|r| r.document_id).collect())
            .unwrap_or_default();
        if ids.is_empty() {
            self.notifier.info("No entries to export");
            return Err(ClientError::validation("No entries to export"));
        }

        match self.api.export_selected(format, &ids, table_name).await {
            Ok(document) => {
                info!(
                    table_name,
                    filename = %document.filename,
                    bytes = document.bytes.len(),
                    "Export downloaded"
                );
                self.notifier.success("Download complete");
                Ok(document)
            }
            Err(err) => {
                warn!(table_name, "Export failed: {}", err);
                self.notifier.error("Export failed");
                Err(err)
            }
        }
    }

    /// One `"{docno} | {docname}"` line per saved entry of `table_name`.
    pub fn copy_text(&self, table_name: &str) -> Result<String, ClientError> {
        match self.group(table_name) {
            Some(group) if !group.rows.is_empty() => Ok(group
                .rows
                .iter()
                .map(|r| format!("{} | {}", r.field("docno"), r.field("docname")))
                .collect::<Vec<_>>()
                .join("\n")),
            _ => Err(ClientError::validation("No entries to copy")),
        }
    }
}
