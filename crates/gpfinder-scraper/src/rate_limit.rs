//! Retry and politeness helpers for requests against the health directory.
//!
//! Transient failures are retried with jittered exponential backoff; a 429
//! additionally waits at least as long as the server's `Retry-After`. A
//! fixed pause is applied before each page fetch. Non-retriable errors
//! (404s, other 4xx statuses, bad URLs) are returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

const MAX_DELAY_MS: u64 = 60_000;

/// 429, 5xx, and transport failures (timeouts included) are transient.
fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::RateLimited { .. } | ScraperError::Http(_) => true,
        ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
        ScraperError::NotFound { .. } | ScraperError::InvalidUrl { .. } => false,
    }
}

/// Delay before retry number `attempt` (1-based), before jitter.
///
/// Doubles from `base_ms`, never drops below a 429's `Retry-After`, and is
/// capped at 60 s.
fn backoff_ms(attempt: u32, base_ms: u64, err: &ScraperError) -> u64 {
    let exponential = base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    let floor = match err {
        ScraperError::RateLimited {
            retry_after_secs, ..
        } => retry_after_secs.saturating_mul(1000),
        _ => 0,
    };
    exponential.max(floor).min(MAX_DELAY_MS)
}

/// Scales `delay_ms` by a random factor in `[0.75, 1.25)`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn jittered(delay_ms: u64) -> u64 {
    (delay_ms as f64 * (0.75 + rand::random::<f64>() * 0.5)) as u64
}

/// Runs `operation`, retrying transient errors up to `max_retries` more
/// times. The last error is returned once retries run out.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if attempt >= max_retries || !is_retriable(&err) {
            return Err(err);
        }
        attempt += 1;
        let delay_ms = jittered(backoff_ms(attempt, backoff_base_ms, &err));
        tracing::warn!(
            attempt,
            max_retries,
            delay_ms,
            error = %err,
            "transient fetch error; retrying after backoff"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

/// Sleeps for the configured inter-request delay. A zero delay is a no-op.
pub(crate) async fn pause(delay_ms: u64) {
    if delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}
