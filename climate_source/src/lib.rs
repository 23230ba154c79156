//! Source fetching for published climate datasets.
//!
//! A dataset is a CSV payload (`Entity`, `Code`, `Year` plus one column per
//! indicator) paired with a JSON metadata document describing each column.
//! This crate only retrieves and decodes those two documents; everything that
//! interprets them lives in `climate_sync`.
//!
//! - [`providers::DataSource`] is the fetch abstraction, implemented by
//!   [`providers::http::HttpSource`] and [`providers::file::FileSource`].
//! - [`io::decode`] turns raw bytes into a fully buffered [`models::CsvTable`].
//! - [`models::DatasetMetadata`] is a lenient view over the metadata document.

pub mod errors;
pub mod io;
pub mod models;
pub mod providers;
