//! Membership cache of records already saved on the server.

use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::api::{DeedsApi, RecordId, SavedGroup};
use crate::broadcast::Notifier;
use crate::error::ClientError;

pub const MSG_ENTRY_SAVED: &str = "Entry saved to Selected Entries";
pub const MSG_SAVE_FAILED: &str = "Failed to save entry";

/// Result of [`SelectionCache::mark_saved`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// Already a member; no request was made.
    AlreadySaved,
    /// The server stored a new entry and the cache now contains it.
    Added,
    /// The server accepted the request but added nothing. The cache is unchanged.
    NotAdded,
    /// A save for the same record is still in flight; no request was made.
    Pending,
}

#[derive(Default)]
struct Members {
    saved: HashSet<RecordId>,
    pending: HashSet<RecordId>,
}

/// Releases an in-flight claim on every exit from `mark_saved`.
struct PendingClaim<'a> {
    cache: &'a SelectionCache,
    id: RecordId,
}

impl Drop for PendingClaim<'_> {
    fn drop(&mut self) {
        self.cache.write().pending.remove(&self.id);
    }
}

/// Record ids known to be saved.
///
/// Membership only grows on a confirmed server acknowledgment, so the set may
/// lag the server but never claims a record the server has not stored. At most
/// one save per record is in flight at a time.
pub struct SelectionCache {
    api: Arc<dyn DeedsApi>,
    notifier: Notifier,
    members: RwLock<Members>,
}

impl SelectionCache {
    pub fn new(api: Arc<dyn DeedsApi>, notifier: Notifier) -> Self {
        Self {
            api,
            notifier,
            members: RwLock::new(Members::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Members> {
        self.members.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Members> {
        self.members.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seeds membership from every saved row on the server.
    pub async fn initialize(&self) -> Result<usize, ClientError> {
        let groups = self.api.selected_rows(&[]).await?;
        let ids = member_ids(&groups);
        let count = ids.len();
        self.write().saved = ids;
        debug!(count, "Selection cache initialized");
        Ok(count)
    }

    /// Replaces membership with the server's current view.
    pub async fn reload(&self) -> Result<usize, ClientError> {
        self.initialize().await
    }

    /// Saves `id` unless it is already known to be saved or being saved.
    pub async fn mark_saved(&self, id: RecordId) -> Result<MarkOutcome, ClientError> {
        {
            let mut members = self.write();
            if members.saved.contains(&id) {
                return Ok(MarkOutcome::AlreadySaved);
            }
            if !members.pending.insert(id) {
                debug!(id, "Save already in flight");
                return Ok(MarkOutcome::Pending);
            }
        }
        let _claim = PendingClaim { cache: self, id };

        match self.api.save_selected(&[id]).await {
            Ok(response) if response.added > 0 => {
                self.write().saved.insert(id);
                self.notifier.success(MSG_ENTRY_SAVED);
                Ok(MarkOutcome::Added)
            }
            Ok(_) => {
                debug!(id, "Save acknowledged without a new entry");
                Ok(MarkOutcome::NotAdded)
            }
            Err(err) => {
                warn!(id, "Failed to save entry: {}", err);
                self.notifier.error(MSG_SAVE_FAILED);
                Err(err)
            }
        }
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.read().saved.contains(&id)
    }

    pub fn is_pending(&self, id: RecordId) -> bool {
        self.read().pending.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.read().saved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().saved.is_empty()
    }
}

fn member_ids(groups: &[SavedGroup]) -> HashSet<RecordId> {
    groups
        .iter()
        .flat_map(|g| g.rows.iter().map(|r| r.document_id))
        .collect()
}
