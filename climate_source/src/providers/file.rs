//! Local filesystem source, for offline runs and fixtures.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use snafu::ResultExt;
use tracing::info;

use crate::{
    io::decode::{decode_csv, decode_metadata},
    models::{CsvTable, DatasetMetadata},
    providers::{DataSource, DecodeSnafu, IoSnafu, ProviderError},
};

/// Reads dataset documents from disk. Accepts plain paths and `file://` URLs;
/// relative paths resolve against `root` when one is set.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    root: Option<PathBuf>,
}

impl FileSource {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let path = Path::new(url.strip_prefix("file://").unwrap_or(url));
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    async fn read(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let path = self.resolve(url);
        let bytes = tokio::fs::read(&path).await.context(IoSnafu {
            path: path.display().to_string(),
        })?;
        info!(path = %path.display(), bytes = bytes.len(), "read local payload");
        Ok(bytes)
    }
}

#[async_trait]
impl DataSource for FileSource {
    async fn fetch(&self, csv_url: &str) -> Result<CsvTable, ProviderError> {
        let bytes = self.read(csv_url).await?;
        decode_csv(&bytes).context(DecodeSnafu { url: csv_url })
    }

    async fn fetch_metadata(&self, meta_url: &str) -> Result<DatasetMetadata, ProviderError> {
        let bytes = self.read(meta_url).await?;
        decode_metadata(&bytes).context(DecodeSnafu { url: meta_url })
    }
}
