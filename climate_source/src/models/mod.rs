//! Data types produced by the fetch layer.

pub mod dataset;
pub mod metadata;
pub mod row;

pub use dataset::{CsvTable, FetchedDataset, SourceDescriptor};
pub use metadata::{ColumnMeta, DatasetMetadata, NUMERIC_TYPE};
pub use row::{CODE_COLUMN, ENTITY_COLUMN, Header, RawRow, YEAR_COLUMN};
