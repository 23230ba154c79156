//! Column metadata published next to each CSV payload.
//!
//! The document looks like `{"columns": {"<key>": {"titleShort": …, "unit":
//! …, "type": "Numeric", …}}, …}`. Upstream revisions add, drop and retype
//! fields, so decoding is deliberately forgiving: an absent `columns` object
//! yields no columns, and any per-column field that is missing or not a
//! string is read as `None`.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::errors::DecodeError;

/// Value of a column's `type` field marking it as an indicator column.
pub const NUMERIC_TYPE: &str = "Numeric";

/// Descriptive fields of one dataset column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMeta {
    pub title_short: Option<String>,
    pub title: Option<String>,
    pub unit: Option<String>,
    pub short_unit: Option<String>,
    pub description_short: Option<String>,
    pub description: Option<String>,
    /// The `type` field (e.g. "Numeric", "String").
    pub column_type: Option<String>,
    /// Link to the column's full metadata page.
    pub full_metadata: Option<String>,
}

impl ColumnMeta {
    fn from_value(v: &Value) -> Self {
        let field = |name: &str| {
            v.get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            title_short: field("titleShort"),
            title: field("title"),
            unit: field("unit"),
            short_unit: field("shortUnit"),
            description_short: field("descriptionShort"),
            description: field("description"),
            column_type: field("type"),
            full_metadata: field("fullMetadata"),
        }
    }

    /// True if the column is flagged as numeric.
    pub fn is_numeric(&self) -> bool {
        self.column_type.as_deref() == Some(NUMERIC_TYPE)
    }
}

/// Column key -> metadata, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatasetMetadata {
    columns: IndexMap<String, ColumnMeta>,
}

impl DatasetMetadata {
    /// Decode a metadata document. Only a payload that is not JSON at all is
    /// an error.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        let doc: Value = serde_json::from_slice(bytes)?;
        Ok(Self::from_value(&doc))
    }

    pub fn from_json_str(s: &str) -> Result<Self, DecodeError> {
        Self::from_json_slice(s.as_bytes())
    }

    fn from_value(doc: &Value) -> Self {
        let Some(columns) = doc.get("columns").and_then(Value::as_object) else {
            warn!("metadata document has no `columns` object; treating every column as undescribed");
            return Self::default();
        };
        let columns = columns
            .iter()
            .map(|(key, v)| (key.trim().to_string(), ColumnMeta::from_value(v)))
            .collect();
        Self { columns }
    }

    /// Adds or replaces one column description.
    pub fn insert(&mut self, key: impl Into<String>, meta: ColumnMeta) {
        self.columns.insert(key.into(), meta);
    }

    pub fn column(&self, key: &str) -> Option<&ColumnMeta> {
        self.columns.get(key)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &ColumnMeta)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Columns flagged numeric, in document order.
    pub fn numeric_columns(&self) -> impl Iterator<Item = (&str, &ColumnMeta)> {
        self.columns().filter(|(_, meta)| meta.is_numeric())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
