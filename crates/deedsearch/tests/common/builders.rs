//! Builders for creating backend responses programmatically.

#![allow(dead_code)]

use serde_json::json;

use deedsearch::api::{
    Facet, JobStatusResponse, Record, RecordId, RemoteJobStatus, SavedGroup, SearchResponse,
    SelectionId, UploadFile,
};

/// A search row with the given doc number and name.
pub fn record(id: RecordId, docno: &str, docname: &str) -> Record {
    serde_json::from_value(json!({
        "id": id,
        "docno": docno,
        "docname": docname,
        "registrationdate": "2021-03-04",
        "sroname": "Central",
        "sellerparty": "Ramesh Kumar",
        "purchaserparty": "Anita Rao",
        "propertydescription": "Plot 14, Ward 3",
        "areaname": "Ward 3",
        "consideration_amt": 150000,
        "dateofexecution": "2021-03-01"
    }))
    .expect("valid record")
}

/// Builder for `SearchResponse`.
#[derive(Default)]
pub struct SearchResponseBuilder {
    results: Vec<Record>,
    total: Option<u64>,
    groups: Vec<Facet>,
}

impl SearchResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` rows named `docname`, numbered from `first_id`.
    pub fn records(mut self, first_id: RecordId, count: usize, docname: &str) -> Self {
        for offset in 0..count as RecordId {
            let id = first_id + offset;
            self.results.push(record(id, &id.to_string(), docname));
        }
        self
    }

    /// Overrides the total; defaults to the number of rows.
    pub fn total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn facet(mut self, label: &str, count: u64) -> Self {
        self.groups.push(Facet {
            label: label.to_string(),
            count,
        });
        self
    }

    pub fn build(self) -> SearchResponse {
        SearchResponse {
            total: self.total.unwrap_or(self.results.len() as u64),
            results: self.results,
            groups: self.groups,
        }
    }
}

pub fn running(processed: u32, total: u32) -> JobStatusResponse {
    JobStatusResponse {
        processed,
        total,
        status: RemoteJobStatus::Running,
        error: None,
    }
}

pub fn done(processed: u32, total: u32) -> JobStatusResponse {
    JobStatusResponse {
        processed,
        total,
        status: RemoteJobStatus::Done,
        error: None,
    }
}

pub fn failed(processed: u32, total: u32, error: &str) -> JobStatusResponse {
    JobStatusResponse {
        processed,
        total,
        status: RemoteJobStatus::Failed,
        error: Some(error.to_string()),
    }
}

pub fn upload_files(names: &[&str]) -> Vec<UploadFile> {
    names
        .iter()
        .map(|name| UploadFile::new(*name, format!("%PDF-1.4 {}", name).into_bytes()))
        .collect()
}

/// A saved group whose rows are `(sel_id, document_id, docno, docname)`.
pub fn saved_group(
    table_name: &str,
    rows: &[(SelectionId, RecordId, &str, &str)],
) -> SavedGroup {
    serde_json::from_value(json!({
        "table_name": table_name,
        "chip_label": table_name.replace('_', " "),
        "rows": rows
            .iter()
            .map(|(sel_id, document_id, docno, docname)| json!({
                "sel_id": sel_id,
                "document_id": document_id,
                "docno": docno,
                "docname": docname,
            }))
            .collect::<Vec<_>>(),
    }))
    .expect("valid saved group")
}
