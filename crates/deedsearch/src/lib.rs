pub mod api;
pub mod broadcast;
pub mod config;
pub mod db;
pub mod error;
pub mod search;
pub mod selection;
pub mod store;
pub mod telemetry;
pub mod upload;

pub use api::{DeedsApi, HttpApi};
pub use broadcast::{Notification, NotificationLevel, Notifier};
pub use config::{load_config, load_config_from_str, ClientConfig};
pub use error::{ClientError, ConfigError, DeedSearchError, Result, StoreError};
pub use search::{SearchField, SearchOutcome, SearchSessionController, SearchState, TableCatalog};
pub use selection::{MarkOutcome, SavedEntries, SelectionCache};
pub use store::{MemoryStore, SessionStore, SqliteStore};
pub use upload::{JobProgress, SubmitOutcome, UploadJobTracker};
