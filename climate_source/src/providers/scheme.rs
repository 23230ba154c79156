//! Per-URL routing between the network and local sources.

use async_trait::async_trait;

use crate::{
    models::{CsvTable, DatasetMetadata},
    providers::{DataSource, ProviderError, ProviderInitError, file::FileSource, http::HttpSource},
};

/// `http://` and `https://` URLs.
pub fn is_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Sends each URL to [`HttpSource`] or [`FileSource`] by its scheme, so a
/// dataset may keep its CSV and metadata documents in different places.
pub struct SchemeSource {
    http: HttpSource,
    file: FileSource,
}

impl SchemeSource {
    pub fn new() -> Result<Self, ProviderInitError> {
        Ok(Self::from_parts(HttpSource::new()?, FileSource::new()))
    }

    pub fn from_parts(http: HttpSource, file: FileSource) -> Self {
        Self { http, file }
    }

    fn route(&self, url: &str) -> &dyn DataSource {
        if is_http(url) {
            return &self.http;
        }
        &self.file
    }
}

#[async_trait]
impl DataSource for SchemeSource {
    async fn fetch(&self, csv_url: &str) -> Result<CsvTable, ProviderError> {
        self.route(csv_url).fetch(csv_url).await
    }

    async fn fetch_metadata(&self, meta_url: &str) -> Result<DatasetMetadata, ProviderError> {
        self.route(meta_url).fetch_metadata(meta_url).await
    }
}
