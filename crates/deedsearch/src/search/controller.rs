//! Search session orchestration: query composition, pagination, facet
//! filtering, sequencing of overlapping requests and persistence.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info_span, warn, Instrument};

use super::facets::next_active;
use super::highlight::{highlight, Highlighted};
use super::state::{SearchField, SearchState, DEFAULT_PER_PAGE};
use super::tables::{recent_table, remember_table};
use crate::api::DeedsApi;
use crate::broadcast::Notifier;
use crate::error::{ClientError, StoreError};
use crate::store::{get_json, set_json, SessionStore, SEARCH_STATE_KEY};

pub const MSG_SEARCH_FAILED: &str = "Search failed";

/// What happened to one `execute_search` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The response replaced the visible results.
    Applied { shown: usize, total: u64 },
    /// A newer search was issued before this one answered; nothing changed.
    Superseded,
    /// No request was needed.
    Skipped,
}

/// Counts an outstanding request for as long as it lives.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Owns one search session.
///
/// Every `execute_search` takes a sequence number; a response whose number is
/// no longer the latest is dropped, so the visible state always reflects the
/// most recently issued search.
pub struct SearchSessionController {
    api: Arc<dyn DeedsApi>,
    notifier: Notifier,
    session: Arc<dyn SessionStore>,
    preferences: Option<Arc<dyn SessionStore>>,
    state: Mutex<SearchState>,
    should_search: AtomicBool,
    sequence: AtomicU64,
    in_flight: AtomicUsize,
}

impl SearchSessionController {
    pub fn new(api: Arc<dyn DeedsApi>, session: Arc<dyn SessionStore>, notifier: Notifier) -> Self {
        Self {
            api,
            notifier,
            session,
            preferences: None,
            state: Mutex::new(SearchState::new(DEFAULT_PER_PAGE)),
            should_search: AtomicBool::new(false),
            sequence: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Durable store used for the recently-used table preference.
    pub fn with_preferences(mut self, preferences: Arc<dyn SessionStore>) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn with_per_page(self, per_page: u32) -> Self {
        self.lock_state().per_page = per_page.max(1);
        self
    }

    fn lock_state(&self) -> MutexGuard<'_, SearchState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Hydrates the session from the persisted state without touching the network.
    ///
    /// Returns whether a persisted state was found. Without one, the most
    /// recently used table is preselected.
    pub fn restore(&self) -> Result<bool, StoreError> {
        match get_json::<SearchState>(self.session.as_ref(), SEARCH_STATE_KEY)? {
            Some(saved) => {
                debug!(
                    page = saved.page,
                    results = saved.results.len(),
                    "Restored search state"
                );
                *self.lock_state() = saved;
                self.should_search.store(true, Ordering::Release);
                Ok(true)
            }
            None => {
                if let Some(recent) = self.preferences.as_deref().and_then(|p| recent_table(p)) {
                    self.lock_state().table_name = recent;
                }
                Ok(false)
            }
        }
    }

    /// Local edit of one input. Does not search.
    pub fn update_field(&self, field: SearchField, value: impl Into<String>) {
        self.lock_state().set_field(field, value);
    }

    /// Selects the table to search and remembers it as the most recent one.
    pub fn set_table(&self, name: &str) -> Result<(), StoreError> {
        let name = name.trim();
        self.lock_state().table_name = name.to_string();
        match &self.preferences {
            Some(preferences) => remember_table(preferences.as_ref(), name),
            None => Ok(()),
        }
    }

    /// Issues one search for the current inputs and replaces the results.
    ///
    /// `reset_page` moves back to page 1 first. Failures notify and leave the
    /// visible state untouched.
    pub async fn execute_search(&self, reset_page: bool) -> Result<SearchOutcome, ClientError> {
        let (seq, query) = {
            let mut state = self.lock_state();
            if reset_page {
                state.page = 1;
            }
            let seq = self.sequence.fetch_add(1, Ordering::AcqRel) + 1;
            (seq, state.build_query())
        };
        self.should_search.store(true, Ordering::Release);

        let _in_flight = InFlight::enter(&self.in_flight);
        let span = info_span!("search", seq, page = query.get("page").unwrap_or("1"));
        let result = self.api.search(&query).instrument(span).await;

        if self.sequence.load(Ordering::Acquire) != seq {
            debug!(seq, "Discarding superseded search response");
            return Ok(SearchOutcome::Superseded);
        }

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!("Search failed: {}", err);
                self.notifier.error(MSG_SEARCH_FAILED);
                return Err(err);
            }
        };

        let snapshot = {
            let mut state = self.lock_state();
            state.results = response.results;
            state.total = response.total;
            state.groups = response.groups;
            state.clone()
        };

        if let Err(e) = set_json(self.session.as_ref(), SEARCH_STATE_KEY, &snapshot) {
            warn!("Failed to persist search state: {}", e);
        }

        debug!("{}", snapshot.status_text());
        Ok(SearchOutcome::Applied {
            shown: snapshot.results.len(),
            total: snapshot.total,
        })
    }

    /// Activates `label`, or clears it when it is already active, then searches page 1.
    pub async fn toggle_facet(&self, label: &str) -> Result<SearchOutcome, ClientError> {
        {
            let mut state = self.lock_state();
            state.active_facet = next_active(state.active_facet.as_deref(), label);
            state.page = 1;
        }
        self.execute_search(false).await
    }

    /// Moves `delta` pages, clamped to the pages the last total allows.
    pub async fn set_page(&self, delta: i64) -> Result<SearchOutcome, ClientError> {
        {
            let mut state = self.lock_state();
            let max_page = i64::from(state.max_page());
            let target = i64::from(state.page).saturating_add(delta).clamp(1, max_page);
            if target == i64::from(state.page) {
                return Ok(SearchOutcome::Skipped);
            }
            state.page = target as u32;
        }
        self.execute_search(false).await
    }

    /// Resets inputs, facet and results and forgets the persisted state.
    ///
    /// Responses to searches issued before the reset are discarded.
    pub fn clear_all(&self) -> Result<(), StoreError> {
        self.lock_state().clear();
        self.sequence.fetch_add(1, Ordering::AcqRel);
        self.should_search.store(false, Ordering::Release);
        self.session.delete(SEARCH_STATE_KEY)
    }

    pub fn highlight<'a>(&self, text: &'a str) -> Highlighted<'a> {
        let terms: Vec<String> = self
            .lock_state()
            .terms()
            .into_iter()
            .map(str::to_string)
            .collect();
        highlight(text, &terms)
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SearchState {
        self.lock_state().clone()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&SearchState) -> R) -> R {
        f(&self.lock_state())
    }

    pub fn loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) > 0
    }

    pub fn should_search(&self) -> bool {
        self.should_search.load(Ordering::Acquire)
    }

    pub fn search_keywords(&self) -> String {
        self.lock_state().keywords()
    }

    pub fn status_text(&self) -> String {
        self.lock_state().status_text()
    }

    pub fn page(&self) -> u32 {
        self.lock_state().page
    }

    pub fn has_prev(&self) -> bool {
        self.lock_state().has_prev()
    }

    pub fn has_next(&self) -> bool {
        self.lock_state().has_next()
    }
}
