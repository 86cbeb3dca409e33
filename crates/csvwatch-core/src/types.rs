//! Result types produced by a CSV import.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One parsed row: header field name to cell value, in column order.
pub type Record = IndexMap<String, String>;

/// The outcome of a successful import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    /// The file the records were read from.
    pub source: PathBuf,
    /// Header fields in file column order.
    pub headers: Vec<String>,
    /// Parsed rows in file order.
    pub records: Vec<Record>,
}

impl ImportResult {
    pub fn new(source: impl Into<PathBuf>, headers: Vec<String>, records: Vec<Record>) -> Self {
        Self {
            source: source.into(),
            headers,
            records,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render the records as a pretty-printed JSON array.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.records)
    }
}
