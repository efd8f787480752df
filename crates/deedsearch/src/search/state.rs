//! Persistable search session state and query construction.

use serde::{Deserialize, Serialize};

use crate::api::{Facet, Record, SearchQuery};
use crate::error::ClientError;

pub const DEFAULT_PER_PAGE: u32 = 100;

/// Free-text and per-column inputs of the search form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    FreeText,
    Purchaser,
    Seller,
    DocName,
    DocNo,
    RegistrationDate,
    TableName,
    PropertyDescription,
}

impl SearchField {
    /// Fields in query-string order.
    pub const ALL: [SearchField; 8] = [
        SearchField::FreeText,
        SearchField::Purchaser,
        SearchField::Seller,
        SearchField::DocName,
        SearchField::DocNo,
        SearchField::RegistrationDate,
        SearchField::TableName,
        SearchField::PropertyDescription,
    ];

    /// Query parameter name understood by `GET /search`.
    pub fn param(&self) -> &'static str {
        match self {
            SearchField::FreeText => "q",
            SearchField::Purchaser => "purchaser",
            SearchField::Seller => "seller",
            SearchField::DocName => "docname",
            SearchField::DocNo => "docno",
            SearchField::RegistrationDate => "registrationdate",
            SearchField::TableName => "table_name",
            SearchField::PropertyDescription => "propertydescription",
        }
    }

    /// Whether the field's value is a user search term. The table only scopes the search.
    pub fn is_term(&self) -> bool {
        !matches!(self, SearchField::TableName)
    }
}

impl std::str::FromStr for SearchField {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        SearchField::ALL
            .into_iter()
            .find(|f| f.param().replace('_', "") == normalized)
            .or(match normalized.as_str() {
                "freetext" | "text" => Some(SearchField::FreeText),
                "table" => Some(SearchField::TableName),
                "property" => Some(SearchField::PropertyDescription),
                _ => None,
            })
            .ok_or_else(|| ClientError::validation(format!("Unknown search field: {}", s)))
    }
}

/// Everything a search session needs to redraw itself, including the
/// literal rows of the last response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchState {
    pub free_text: String,
    pub purchaser: String,
    pub seller: String,
    pub doc_name: String,
    pub doc_no: String,
    pub registration_date: String,
    pub property_description: String,
    pub table_name: String,
    pub active_facet: Option<String>,
    pub page: u32,
    pub per_page: u32,
    pub results: Vec<Record>,
    pub total: u64,
    pub groups: Vec<Facet>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE)
    }
}

impl SearchState {
    pub fn new(per_page: u32) -> Self {
        Self {
            free_text: String::new(),
            purchaser: String::new(),
            seller: String::new(),
            doc_name: String::new(),
            doc_no: String::new(),
            registration_date: String::new(),
            property_description: String::new(),
            table_name: String::new(),
            active_facet: None,
            page: 1,
            per_page: per_page.max(1),
            results: Vec::new(),
            total: 0,
            groups: Vec::new(),
        }
    }

    pub fn field(&self, field: SearchField) -> &str {
        match field {
            SearchField::FreeText => &self.free_text,
            SearchField::Purchaser => &self.purchaser,
            SearchField::Seller => &self.seller,
            SearchField::DocName => &self.doc_name,
            SearchField::DocNo => &self.doc_no,
            SearchField::RegistrationDate => &self.registration_date,
            SearchField::TableName => &self.table_name,
            SearchField::PropertyDescription => &self.property_description,
        }
    }

    pub fn set_field(&mut self, field: SearchField, value: impl Into<String>) {
        let slot = match field {
            SearchField::FreeText => &mut self.free_text,
            SearchField::Purchaser => &mut self.purchaser,
            SearchField::Seller => &mut self.seller,
            SearchField::DocName => &mut self.doc_name,
            SearchField::DocNo => &mut self.doc_no,
            SearchField::RegistrationDate => &mut self.registration_date,
            SearchField::TableName => &mut self.table_name,
            SearchField::PropertyDescription => &mut self.property_description,
        };
        *slot = value.into();
    }

    /// Query for the current inputs, facet and page.
    pub fn build_query(&self) -> SearchQuery {
        let mut query = SearchQuery::new();
        for field in SearchField::ALL {
            query.push_non_empty(field.param(), self.field(field));
        }
        if let Some(facet) = &self.active_facet {
            query.push_non_empty("docname_filter", facet);
        }
        query.push("page", self.page);
        query.push("per_page", self.per_page);
        query
    }

    /// Non-empty search terms, in form order.
    pub fn terms(&self) -> Vec<&str> {
        [
            &self.free_text,
            &self.purchaser,
            &self.seller,
            &self.doc_name,
            &self.doc_no,
            &self.property_description,
            &self.registration_date,
        ]
        .into_iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
    }

    /// Human summary of what was searched for.
    pub fn keywords(&self) -> String {
        let mut keywords = self.terms();
        if let Some(facet) = self.active_facet.as_deref().filter(|f| !f.is_empty()) {
            keywords.push(facet);
        }
        if keywords.is_empty() {
            "No Keywords Provided".to_string()
        } else {
            keywords.join(", ")
        }
    }

    pub fn status_text(&self) -> String {
        format!("Showing {} of {} results", self.results.len(), self.total)
    }

    /// Last reachable page; at least 1.
    pub fn max_page(&self) -> u32 {
        let per_page = u64::from(self.per_page.max(1));
        let pages = self.total.div_ceil(per_page).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) * u64::from(self.per_page) < self.total
    }

    /// Resets inputs, facet, results and page. The table selection and page size survive.
    pub fn clear(&mut self) {
        let table_name = std::mem::take(&mut self.table_name);
        *self = SearchState::new(self.per_page);
        self.table_name = table_name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_order_and_blank_fields() {
        let mut state = SearchState::default();
        state.set_field(SearchField::PropertyDescription, "plot 4");
        state.set_field(SearchField::FreeText, "kumar");
        state.set_field(SearchField::Seller, "  ");
        state.set_field(SearchField::TableName, "deeds_2021");

        let query = state.build_query();
        let names: Vec<&str> = query.pairs().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            names,
            vec!["q", "table_name", "propertydescription", "page", "per_page"]
        );
        assert_eq!(query.get("per_page"), Some("100"));
    }

    #[test]
    fn test_query_includes_facet() {
        let mut state = SearchState::default();
        state.doc_no = "1234".into();
        state.active_facet = Some("Sale Deed".into());
        state.page = 2;

        let query = state.build_query();
        assert_eq!(query.get("docno"), Some("1234"));
        assert_eq!(query.get("docname_filter"), Some("Sale Deed"));
        assert_eq!(query.get("page"), Some("2"));
    }

    #[test]
    fn test_keywords() {
        let mut state = SearchState::default();
        assert_eq!(state.keywords(), "No Keywords Provided");

        state.free_text = "kumar".into();
        state.registration_date = "2021-01-05".into();
        state.table_name = "deeds_2021".into();
        state.active_facet = Some("Gift Deed".into());
        assert_eq!(state.keywords(), "kumar, 2021-01-05, Gift Deed");
    }

    #[test]
    fn test_page_bounds() {
        let mut state = SearchState::default();
        assert_eq!(state.max_page(), 1);
        assert!(!state.has_next());

        state.total = 250;
        assert_eq!(state.max_page(), 3);
        assert!(state.has_next());
        assert!(!state.has_prev());

        state.page = 3;
        assert!(!state.has_next());
        assert!(state.has_prev());

        state.total = 300;
        assert_eq!(state.max_page(), 3);
    }

    #[test]
    fn test_clear_keeps_table_and_page_size() {
        let mut state = SearchState::new(50);
        state.free_text = "kumar".into();
        state.table_name = "deeds_2021".into();
        state.active_facet = Some("Sale Deed".into());
        state.page = 4;
        state.total = 900;

        state.clear();
        assert_eq!(state.table_name, "deeds_2021");
        assert_eq!(state.per_page, 50);
        assert_eq!(state.page, 1);
        assert!(state.free_text.is_empty());
        assert!(state.active_facet.is_none());
        assert_eq!(state.total, 0);
    }

    #[test]
    fn test_field_parsing() {
        assert_eq!("docno".parse::<SearchField>().unwrap(), SearchField::DocNo);
        assert_eq!("doc-name".parse::<SearchField>().unwrap(), SearchField::DocName);
        assert_eq!("q".parse::<SearchField>().unwrap(), SearchField::FreeText);
        assert_eq!("table".parse::<SearchField>().unwrap(), SearchField::TableName);
        assert!("colour".parse::<SearchField>().is_err());
    }

    #[test]
    fn test_restores_from_partial_json() {
        let state: SearchState = serde_json::from_str(r#"{"freeText": "kumar"}"#).unwrap();
        assert_eq!(state.free_text, "kumar");
        assert_eq!(state.page, 1);
        assert_eq!(state.per_page, DEFAULT_PER_PAGE);
    }
}
