//! Saved-entry membership and the saved entries view.

pub mod cache;
pub mod saved;

pub use cache::{MarkOutcome, SelectionCache, MSG_ENTRY_SAVED, MSG_SAVE_FAILED};
pub use saved::SavedEntries;
