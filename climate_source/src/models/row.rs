//! One decoded CSV row, addressable by column name.

use std::sync::Arc;

use csv::StringRecord;
use indexmap::IndexMap;

/// Column carrying the row's subject (country or aggregate name).
pub const ENTITY_COLUMN: &str = "Entity";
/// Column carrying the source's region code (ISO alpha-3, `OWID_*`, or blank).
pub const CODE_COLUMN: &str = "Code";
/// Column carrying the observation year.
pub const YEAR_COLUMN: &str = "Year";

/// Column name -> position lookup, shared by every row of one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    positions: IndexMap<String, usize>,
}

impl Header {
    /// Builds a header from column names in file order. Names are trimmed;
    /// when a name repeats, the first occurrence wins.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut positions = IndexMap::new();
        for (i, name) in names.into_iter().enumerate() {
            positions.entry(name.as_ref().trim().to_string()).or_insert(i);
        }
        Self { positions }
    }

    /// Position of `column`, if present.
    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    /// True if the header names `column`.
    pub fn contains(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    /// Column names in file order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.positions.keys().map(String::as_str)
    }

    /// Number of distinct columns.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True if the header has no columns.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// A row-mapping: values of one CSV record keyed by header name.
#[derive(Debug, Clone)]
pub struct RawRow {
    header: Arc<Header>,
    values: StringRecord,
}

impl RawRow {
    pub fn new(header: Arc<Header>, values: StringRecord) -> Self {
        Self { header, values }
    }

    /// Raw value of `column`. `None` when the column is absent from the
    /// header or the record is short.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.header
            .position(column)
            .and_then(|i| self.values.get(i))
    }

    /// Entity name, trimmed. Empty when absent.
    pub fn entity(&self) -> &str {
        self.get(ENTITY_COLUMN).map(str::trim).unwrap_or("")
    }

    /// Source region code, trimmed; `None` when absent or blank.
    pub fn code(&self) -> Option<&str> {
        self.get(CODE_COLUMN)
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Raw year string, trimmed; `None` when absent or blank.
    pub fn year(&self) -> Option<&str> {
        self.get(YEAR_COLUMN)
            .map(str::trim)
            .filter(|y| !y.is_empty())
    }
}
