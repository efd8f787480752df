//! Tables known to the server, most recently used first.

use std::sync::Arc;

use tracing::warn;

use crate::api::DeedsApi;
use crate::error::{ClientError, StoreError};
use crate::store::{SessionStore, RECENT_TABLE_KEY};

/// Most recently used table, if one was remembered.
///
/// Store failures are logged and treated as "nothing remembered".
pub fn recent_table(store: &dyn SessionStore) -> Option<String> {
    match store.get(RECENT_TABLE_KEY) {
        Ok(value) => value.filter(|v| !v.trim().is_empty()),
        Err(e) => {
            warn!("Failed to read recent table: {}", e);
            None
        }
    }
}

/// Records `name` as the most recently used table. Blank names are ignored.
pub fn remember_table(store: &dyn SessionStore, name: &str) -> Result<(), StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(());
    }
    store.set(RECENT_TABLE_KEY, name)
}

/// Orders `tables` with `recent` first, without duplicating it.
pub fn order_tables(tables: &[String], recent: Option<&str>) -> Vec<String> {
    match recent {
        Some(recent) => std::iter::once(recent.to_string())
            .chain(tables.iter().filter(|t| t.as_str() != recent).cloned())
            .collect(),
        None => tables.to_vec(),
    }
}

pub struct TableCatalog {
    api: Arc<dyn DeedsApi>,
    preferences: Arc<dyn SessionStore>,
    tables: Vec<String>,
}

impl TableCatalog {
    pub fn new(api: Arc<dyn DeedsApi>, preferences: Arc<dyn SessionStore>) -> Self {
        Self {
            api,
            preferences,
            tables: Vec::new(),
        }
    }

    /// Fetches the table list from the server.
    pub async fn load(&mut self) -> Result<&[String], ClientError> {
        self.tables = self.api.tables().await?;
        tracing::debug!(count = self.tables.len(), "Loaded table list");
        Ok(&self.tables)
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn recent(&self) -> Option<String> {
        recent_table(self.preferences.as_ref())
    }

    pub fn remember(&self, name: &str) -> Result<(), StoreError> {
        remember_table(self.preferences.as_ref(), name)
    }

    /// Loaded tables with the most recently used one first.
    pub fn ordered(&self) -> Vec<String> {
        order_tables(&self.tables, self.recent().as_deref())
    }
}
