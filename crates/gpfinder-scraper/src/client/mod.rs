//! HTTP client for the public GP directory and postcode lookup service.

mod urls;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::ScraperError;
use crate::fetch::Fetch;
use crate::rate_limit::retry_with_backoff;

pub use urls::{contact_url, id_from_url, resolve_href, reviews_url, search_page_url};

/// [`Fetch`] over HTTP for the health directory and postcodes.io.
///
/// 429 and 404 come back as their own [`ScraperError`] variants and any other
/// non-2xx status as `UnexpectedStatus`. Transient failures are retried with
/// jittered exponential backoff.
pub struct DirectoryClient {
    client: Client,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl DirectoryClient {
    /// `max_retries` counts attempts after the first; `0` disables retrying.
    ///
    /// # Errors
    ///
    /// [`ScraperError::Http`] if the TLS backend cannot be initialised.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_ms,
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<String, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-GB,en;q=0.5")
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ScraperError::RateLimited {
                url: url.to_owned(),
                retry_after_secs,
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound {
                url: url.to_owned(),
            });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl Fetch for DirectoryClient {
    async fn fetch(&self, url: &str) -> Result<String, ScraperError> {
        tracing::debug!(url, "fetching");
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || self.fetch_once(url)).await
    }
}
