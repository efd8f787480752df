//! Key-value stores for client state that outlives a single view.
//!
//! Two scopes exist: the session scope (search state, gone when the process
//! exits) and the durable device scope (preferences such as the most recently
//! used table). Both sit behind [`SessionStore`] so controllers can be driven
//! by an in-memory store in tests.

pub mod memory;
pub mod sqlite;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Session-scoped key holding the serialized search state.
pub const SEARCH_STATE_KEY: &str = "searchState";

/// Durable key holding the most recently used table name, stored as the raw name.
pub const RECENT_TABLE_KEY: &str = "recentTable";

/// Get/set/delete over string keys. Values are opaque strings (JSON by convention).
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Reads and deserializes the JSON value under `key`.
pub fn get_json<T: DeserializeOwned>(
    store: &dyn SessionStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Deserialize {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Serializes `value` as JSON and stores it under `key`.
pub fn set_json<T: Serialize>(
    store: &dyn SessionStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}
