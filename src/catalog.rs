//! Paginated job-listing client
//!
//! The listing endpoint returns one JSON array per page and carries no
//! pagination metadata, so this module only fetches raw bytes; the page loop in
//! [`sync`](crate::sync) decides when to stop.

use crate::config::ApiConfig;
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::types::OrderingMode;
use async_trait::async_trait;
use url::Url;

/// Source of raw catalog pages
///
/// The HTTP implementation is [`HttpCatalogClient`]; tests substitute scripted
/// sources to drive the page loop.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch page `page` (1-based) of completed jobs for `credentials.user_id`
    ///
    /// Returns the unparsed response body, whatever the HTTP status. Fails
    /// without retrying, and only when no body could be obtained.
    async fn fetch_page(
        &self,
        credentials: &Credentials,
        ordering: OrderingMode,
        page: u32,
    ) -> Result<Vec<u8>>;
}

/// [`CatalogSource`] backed by the remote listing endpoint
#[derive(Clone, Debug)]
pub struct HttpCatalogClient {
    client: reqwest::Client,
    endpoint: Url,
    user_agent: String,
    cookie_name: String,
}

impl HttpCatalogClient {
    /// Create a client for the endpoint described by `api`
    ///
    /// # Errors
    /// Returns a configuration error if the endpoint URL does not parse or the
    /// HTTP client cannot be built.
    pub fn new(api: &ApiConfig) -> Result<Self> {
        let endpoint = Url::parse(&api.recent_jobs_url).map_err(|e| Error::Config {
            message: format!("invalid URL {:?}: {}", api.recent_jobs_url, e),
            key: Some("api.recent_jobs_url".to_string()),
        })?;

        Ok(Self {
            client: api.http_client()?,
            endpoint,
            user_agent: api.user_agent.clone(),
            cookie_name: api.session_cookie_name.clone(),
        })
    }

    /// Full request URL for one page
    pub fn page_url(&self, user_id: &str, ordering: OrderingMode, page: u32) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("orderBy", ordering.as_str())
            .append_pair("jobStatus", "completed")
            .append_pair("userId", user_id)
            .append_pair("dedupe", "true")
            .append_pair("refreshApi", "0")
            .append_pair("page", &page.to_string());
        url
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogClient {
    async fn fetch_page(
        &self,
        credentials: &Credentials,
        ordering: OrderingMode,
        page: u32,
    ) -> Result<Vec<u8>> {
        let url = self.page_url(&credentials.user_id, ordering, page);
        tracing::debug!(page, %ordering, "Fetching catalog page");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(
                reqwest::header::COOKIE,
                format!("{}={}", self.cookie_name, credentials.session_token),
            )
            .send()
            .await
            .map_err(|e| Error::CatalogFetch {
                page,
                reason: if e.is_timeout() {
                    format!("request timed out: {}", e)
                } else if e.is_connect() {
                    format!("connection failed: {}", e)
                } else {
                    e.to_string()
                },
            })?;

        // Error bodies are still returned so the page dump shows what the server said
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(page, status = %status, "Catalog request rejected");
        }

        let body = response.bytes().await.map_err(|e| Error::CatalogFetch {
            page,
            reason: format!("failed to read response body: {}", e),
        })?;
        Ok(body.to_vec())
    }
}
