//! The fetch capability injected into every network-facing stage.

use async_trait::async_trait;

use crate::error::ScraperError;

/// Turns a URL into a response body.
///
/// Implementations own retries and timeouts; callers treat any `Err` as a
/// final fetch failure.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ScraperError>;
}
