//! Search session: state, facets, highlighting and the table catalog.

pub mod controller;
pub mod facets;
pub mod highlight;
pub mod state;
pub mod tables;

pub use controller::{SearchOutcome, SearchSessionController, MSG_SEARCH_FAILED};
pub use facets::{FacetChip, FacetPanel};
pub use highlight::{highlight, Highlighted, Span};
pub use state::{SearchField, SearchState, DEFAULT_PER_PAGE};
pub use tables::TableCatalog;
