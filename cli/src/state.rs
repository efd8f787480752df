//! Wiring of configuration, transport, stores and notifier for one CLI run.

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::broadcast;

use deedsearch::broadcast::{Notification, Notifier};
use deedsearch::search::{SearchSessionController, TableCatalog};
use deedsearch::selection::{SavedEntries, SelectionCache};
use deedsearch::store::{MemoryStore, SessionStore, SqliteStore};
use deedsearch::upload::UploadJobTracker;
use deedsearch::{ClientConfig, DeedsApi, HttpApi};

/// Shared handles for the components a command needs.
pub struct AppState {
    pub config: ClientConfig,
    pub api: Arc<dyn DeedsApi>,
    pub notifier: Notifier,
    /// Lives as long as the process.
    pub session: Arc<dyn SessionStore>,
    /// Survives restarts.
    pub preferences: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(config: ClientConfig) -> deedsearch::Result<Self> {
        let api: Arc<dyn DeedsApi> = Arc::new(HttpApi::new(&config)?);

        let preferences: Arc<dyn SessionStore> = match config.data_directory() {
            Some(dir) => {
                debug!("Using preference store in {}", dir.display());
                Arc::new(SqliteStore::open(&dir)?)
            }
            None => {
                warn!("No data directory available; preferences will not be kept");
                Arc::new(SqliteStore::open_in_memory()?)
            }
        };

        Ok(Self {
            config,
            api,
            notifier: Notifier::default(),
            session: Arc::new(MemoryStore::new()),
            preferences,
        })
    }

    pub fn controller(&self) -> SearchSessionController {
        SearchSessionController::new(
            Arc::clone(&self.api),
            Arc::clone(&self.session),
            self.notifier.clone(),
        )
        .with_preferences(Arc::clone(&self.preferences))
        .with_per_page(self.config.per_page)
    }

    pub fn tracker(&self) -> UploadJobTracker {
        UploadJobTracker::new(
            Arc::clone(&self.api),
            self.notifier.clone(),
            self.config.poll_interval(),
        )
    }

    pub fn selection_cache(&self) -> SelectionCache {
        SelectionCache::new(Arc::clone(&self.api), self.notifier.clone())
    }

    pub fn saved_entries(&self) -> SavedEntries {
        SavedEntries::new(Arc::clone(&self.api), self.notifier.clone())
    }

    pub fn table_catalog(&self) -> TableCatalog {
        TableCatalog::new(Arc::clone(&self.api), Arc::clone(&self.preferences))
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }
}

/// Prints every notification received so far to stderr.
pub fn flush_notifications(rx: &mut broadcast::Receiver<Notification>) {
    while let Ok(notification) = rx.try_recv() {
        eprintln!("[{}] {}", notification.level, notification.message);
    }
}
