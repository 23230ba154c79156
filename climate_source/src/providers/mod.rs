//! Source abstraction for dataset payloads.
//!
//! [`DataSource`] is the unified interface for retrieving a dataset's CSV
//! payload and its metadata document. Implementations handle transport only;
//! both documents are decoded here into buffered types so callers can make
//! several passes over the rows.
//!
//! The trait is async and object safe, so the runtime can hold a source as
//! `Box<dyn DataSource>`; [`scheme::SchemeSource`] picks the transport for
//! each URL separately.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use climate_source::models::{CsvTable, DatasetMetadata};
//! use climate_source::providers::{DataSource, ProviderError};
//!
//! struct EmptySource;
//!
//! #[async_trait]
//! impl DataSource for EmptySource {
//!     async fn fetch(&self, _csv_url: &str) -> Result<CsvTable, ProviderError> {
//!         Ok(CsvTable::default())
//!     }
//!
//!     async fn fetch_metadata(&self, _meta_url: &str) -> Result<DatasetMetadata, ProviderError> {
//!         Ok(DatasetMetadata::default())
//!     }
//! }
//! ```

pub mod file;
pub mod http;
pub mod scheme;

use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

use crate::{
    errors::DecodeError,
    models::{CsvTable, DatasetMetadata, FetchedDataset, SourceDescriptor},
};

/// Retrieves and decodes the two documents of a dataset.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetches and decodes the CSV payload at `csv_url`.
    ///
    /// # Returns
    ///
    /// * `Ok(CsvTable)` - every row, buffered in memory.
    /// * `Err(ProviderError)` - transport failure, non-2xx status, or a
    ///   payload that cannot be decoded. All of these are fatal to a run.
    async fn fetch(&self, csv_url: &str) -> Result<CsvTable, ProviderError>;

    /// Fetches and decodes the metadata document at `meta_url`.
    async fn fetch_metadata(&self, meta_url: &str) -> Result<DatasetMetadata, ProviderError>;

    /// Fetches metadata first, then the CSV payload.
    async fn fetch_dataset(
        &self,
        descriptor: &SourceDescriptor,
    ) -> Result<FetchedDataset, ProviderError> {
        let metadata = self.fetch_metadata(&descriptor.meta_url).await?;
        let table = self.fetch(&descriptor.csv_url).await?;
        Ok(FetchedDataset {
            descriptor: descriptor.clone(),
            table,
            metadata,
        })
    }
}

/// Errors that can occur during the creation of a source instance.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `DataSource` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// The request could not be sent or its body could not be read.
    #[snafu(display("request to {url} failed: {source}"))]
    Reqwest {
        url: String,
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The server answered with a non-success status.
    #[snafu(display("{url} answered {status}: {message}"))]
    Api {
        url: String,
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// A local payload could not be read.
    #[snafu(display("failed to read {path}: {source}"))]
    Io {
        path: String,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// The payload was fetched but could not be decoded.
    #[snafu(display("failed to decode {url}: {source}"))]
    Decode {
        url: String,
        source: DecodeError,
        backtrace: Backtrace,
    },
}

/// The source used by the CLI: `http(s)://` URLs go over the network,
/// anything else is read from the local filesystem, decided per URL.
pub fn build_source() -> Result<Box<dyn DataSource>, ProviderInitError> {
    Ok(Box::new(scheme::SchemeSource::new()?))
}
