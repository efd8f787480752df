//! Group summaries of the current result set and the exclusive facet filter.

use crate::api::Facet;

use super::state::SearchState;

/// One clickable group summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacetChip<'a> {
    pub label: &'a str,
    pub count: u64,
    pub active: bool,
}

/// Read-only view over the groups of the last response.
#[derive(Debug, Clone, Copy)]
pub struct FacetPanel<'a> {
    groups: &'a [Facet],
    active: Option<&'a str>,
}

impl<'a> FacetPanel<'a> {
    pub fn new(state: &'a SearchState) -> Self {
        Self {
            groups: &state.groups,
            active: state.active_facet.as_deref(),
        }
    }

    pub fn chips(&self) -> impl Iterator<Item = FacetChip<'a>> {
        let active = self.active;
        self.groups.iter().map(move |g| FacetChip {
            label: &g.label,
            count: g.count,
            active: active == Some(g.label.as_str()),
        })
    }

    pub fn active(&self) -> Option<&'a str> {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }
}

/// Facet that is active after clicking `label`: clicking the active facet clears it.
pub fn next_active(current: Option<&str>, label: &str) -> Option<String> {
    if current == Some(label) {
        None
    } else {
        Some(label.to_string())
    }
}
