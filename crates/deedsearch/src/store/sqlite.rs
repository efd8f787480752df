use std::path::Path;

use super::SessionStore;
use crate::db::{self, preference_repo, Database};
use crate::error::StoreError;

/// Durable store backed by the SQLite preference table.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens the preference database inside `data_directory`.
    pub fn open(data_directory: &Path) -> Result<Self, StoreError> {
        let db = Database::open(&db::database_path(data_directory))?;
        Ok(Self::new(db))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self::new(Database::open_in_memory()?))
    }
}

impl SessionStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(preference_repo::find(&self.db, key)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Ok(preference_repo::upsert(&self.db, key, value)?)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        preference_repo::delete(&self.db, key)?;
        Ok(())
    }
}
