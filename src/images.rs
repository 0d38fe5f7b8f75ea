//! Single-image retrieval

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::Path;

/// Downloads one image URL to one file
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch `url` and write the whole body to `dest`, replacing any existing file
    ///
    /// The caller is responsible for having validated `dest`.
    async fn download_image(&self, url: &str, dest: &Path) -> Result<()>;
}

/// [`ImageFetcher`] issuing plain GET requests (no custom headers)
#[derive(Clone, Debug)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    /// Create a fetcher honoring `api.request_timeout`
    pub fn new(api: &ApiConfig) -> Result<Self> {
        Ok(Self {
            client: api.http_client()?,
        })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn download_image(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::ImageDownload {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ImageDownload {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        let bytes = response.bytes().await.map_err(|e| Error::ImageDownload {
            url: url.to_string(),
            reason: format!("failed to read response body: {}", e),
        })?;

        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|source| Error::ImageWrite {
                path: dest.to_path_buf(),
                source,
            })?;

        tracing::debug!(url, dest = %dest.display(), bytes = bytes.len(), "Image written");
        Ok(())
    }
}
