use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::error::{AstroError, Result};

const USER_AGENT: &str = concat!("astrorank/", env!("CARGO_PKG_VERSION"));

/// Where raw FITS bytes come from
#[async_trait]
pub trait RasterSource: Send + Sync {
    /// Download the raster at `url`. Every failure is `FetchFailed`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// HTTP download with a bounded per-request timeout
pub struct HttpRasterSource {
    client: Client,
    timeout: Duration,
}

impl HttpRasterSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AstroError::FetchFailed(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl RasterSource for HttpRasterSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(|e| self.describe(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AstroError::FetchFailed(format!("HTTP {} from {}", status, url)));
        }

        let bytes = response.bytes().await.map_err(|e| self.describe(e))?;
        tracing::debug!("Received {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

impl HttpRasterSource {
    fn describe(&self, e: reqwest::Error) -> AstroError {
        if e.is_timeout() {
            AstroError::FetchFailed(format!("timeout after {}s", self.timeout.as_secs()))
        } else {
            AstroError::FetchFailed(e.to_string())
        }
    }
}
