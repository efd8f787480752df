//! Errors raised by the preference database.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The data directory or database file could not be created.
    #[error("Cannot prepare preference database at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An embedded schema script failed.
    #[error("Preference schema migration {version} failed: {reason}")]
    Migration { version: u32, reason: String },

    /// A thread panicked while holding the connection.
    #[error("Preference database lock poisoned")]
    LockPoisoned,
}
