//! Buffered dataset payloads.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::{
    metadata::DatasetMetadata,
    row::{Header, RawRow},
};

/// Where a dataset's two documents live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// CSV payload location (`https://…`, `file://…`, or a local path).
    pub csv_url: String,
    /// Metadata document location.
    pub meta_url: String,
}

/// A fully decoded CSV payload.
///
/// Rows are held in memory so callers can make as many passes as they need.
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    header: Arc<Header>,
    rows: Vec<RawRow>,
}

impl CsvTable {
    pub fn new(header: Arc<Header>, rows: Vec<RawRow>) -> Self {
        Self { header, rows }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<'a> IntoIterator for &'a CsvTable {
    type Item = &'a RawRow;
    type IntoIter = std::slice::Iter<'a, RawRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Both documents of one dataset, fetched and decoded.
#[derive(Debug, Clone)]
pub struct FetchedDataset {
    pub descriptor: SourceDescriptor,
    pub table: CsvTable,
    pub metadata: DatasetMetadata,
}
