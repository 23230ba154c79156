//! CSV and metadata decoding.

use std::sync::Arc;

use csv::ReaderBuilder;

use crate::{
    errors::DecodeError,
    models::{
        dataset::CsvTable,
        metadata::DatasetMetadata,
        row::{ENTITY_COLUMN, Header, RawRow, YEAR_COLUMN},
    },
};

const UTF8_BOM: &str = "\u{feff}";

/// Decode a CSV payload into a buffered table.
///
/// The bytes must be UTF-8 (a leading BOM is dropped). The header must name
/// `Entity` and `Year`; `Code` may be absent. Records with fewer fields than
/// the header are accepted and read as missing values.
pub fn decode_csv(bytes: &[u8]) -> Result<CsvTable, DecodeError> {
    let text = std::str::from_utf8(bytes)?;
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);

    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let header = Arc::new(Header::new(rdr.headers()?.iter()));
    for required in [ENTITY_COLUMN, YEAR_COLUMN] {
        if !header.contains(required) {
            return Err(DecodeError::MissingColumn(required));
        }
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        rows.push(RawRow::new(Arc::clone(&header), record?));
    }
    Ok(CsvTable::new(header, rows))
}

/// Decode a metadata document. See [`DatasetMetadata`] for leniency rules.
pub fn decode_metadata(bytes: &[u8]) -> Result<DatasetMetadata, DecodeError> {
    let bytes = bytes.strip_prefix(UTF8_BOM.as_bytes()).unwrap_or(bytes);
    DatasetMetadata::from_json_slice(bytes)
}
