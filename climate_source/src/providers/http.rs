//! Network source backed by `reqwest`.

use async_trait::async_trait;
use reqwest::Client;
use snafu::ResultExt;
use tracing::info;

use crate::{
    io::decode::{decode_csv, decode_metadata},
    models::{CsvTable, DatasetMetadata},
    providers::{
        ApiSnafu, ClientBuildSnafu, DataSource, DecodeSnafu, ProviderError, ProviderInitError,
        ReqwestSnafu,
    },
};

const USER_AGENT: &str = concat!("climate-sync/", env!("CARGO_PKG_VERSION"));

/// Fetches dataset documents over HTTP(S).
///
/// No timeout or retry policy is applied: a failed fetch surfaces to the
/// caller, and re-running the job is the retry.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    /// Creates a source with a default client.
    pub fn new() -> Result<Self, ProviderInitError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context(ClientBuildSnafu)?;
        Ok(Self { client })
    }

    /// Wraps a preconfigured client (proxies, TLS roots, timeouts).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context(ReqwestSnafu { url })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return ApiSnafu {
                url,
                status: status.as_u16(),
                message,
            }
            .fail();
        }

        let body = response.bytes().await.context(ReqwestSnafu { url })?;
        info!(url, bytes = body.len(), "downloaded");
        Ok(body.to_vec())
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch(&self, csv_url: &str) -> Result<CsvTable, ProviderError> {
        let body = self.get_bytes(csv_url).await?;
        let table = decode_csv(&body).context(DecodeSnafu { url: csv_url })?;
        info!(url = csv_url, rows = table.len(), "decoded CSV payload");
        Ok(table)
    }

    async fn fetch_metadata(&self, meta_url: &str) -> Result<DatasetMetadata, ProviderError> {
        let body = self.get_bytes(meta_url).await?;
        decode_metadata(&body).context(DecodeSnafu { url: meta_url })
    }
}
