//! Per-surgery detail fetching with a resumable raw cache.
//!
//! A stored document (or tombstone) for an identifier is a cache hit and no
//! request is made. A failed contact page fetch is persisted as a tombstone
//! so the batch carries on and later stages see "no enrichable data". When
//! retrying failures, tombstones are fetched again and documents missing
//! their reviews page get only that page re-requested.

use std::collections::HashMap;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use gpfinder_core::CandidateRecord;

use crate::client::{contact_url, reviews_url};
use crate::error::StoreError;
use crate::fetch::Fetch;
use crate::rate_limit::pause;
use crate::store::{load_detail, save_detail, RawDetailDocument, RawStore, StoredDetail, Tombstone};

/// Knobs for [`fetch_details`].
#[derive(Debug, Clone)]
pub struct DetailOptions {
    /// Delay before each page request.
    pub inter_request_delay_ms: u64,
    /// Upper bound on surgeries fetched concurrently.
    pub max_concurrent: usize,
    /// Re-attempt tombstones and documents whose reviews page is missing.
    pub retry_failed: bool,
}

/// Returns the stored detail for `candidate`, fetching it if needed.
///
/// # Errors
///
/// Only raw store failures are errors; fetch failures become tombstones.
pub async fn fetch_detail(
    fetch: &dyn Fetch,
    store: &dyn RawStore,
    candidate: &CandidateRecord,
    options: &DetailOptions,
) -> Result<StoredDetail, StoreError> {
    let id = candidate.id.as_str();

    match load_detail(store, id).await? {
        Some(StoredDetail::Document(doc)) if options.retry_failed && doc.reviews_html.is_none() => {
            tracing::info!(id, "retrying missing reviews page");
            let (reviews_html, reviews_error) = fetch_reviews(fetch, candidate, options).await;
            let document = StoredDetail::Document(RawDetailDocument {
                reviews_html,
                reviews_error,
                fetched_at: Utc::now(),
                ..doc
            });
            save_detail(store, &document).await?;
            return Ok(document);
        }
        Some(cached) if !(cached.is_tombstone() && options.retry_failed) => {
            tracing::debug!(id, tombstone = cached.is_tombstone(), "detail cache hit");
            return Ok(cached);
        }
        Some(_) => tracing::info!(id, "retrying tombstoned detail"),
        None => {}
    }

    pause(options.inter_request_delay_ms).await;
    let contact_html = match fetch.fetch(&contact_url(&candidate.nhs_url)).await {
        Ok(html) => html,
        Err(e) => {
            tracing::warn!(id, error = %e, "detail fetch failed; writing tombstone");
            let tombstone = StoredDetail::Tombstone(Tombstone {
                id: id.to_owned(),
                reason: e.to_string(),
                failed_at: Utc::now(),
            });
            save_detail(store, &tombstone).await?;
            return Ok(tombstone);
        }
    };

    let (reviews_html, reviews_error) = fetch_reviews(fetch, candidate, options).await;
    let document = StoredDetail::Document(RawDetailDocument {
        id: id.to_owned(),
        contact_html,
        reviews_html,
        reviews_error,
        fetched_at: Utc::now(),
    });
    save_detail(store, &document).await?;
    Ok(document)
}

/// Fetches the ratings page, returning either its body or why it is missing.
async fn fetch_reviews(
    fetch: &dyn Fetch,
    candidate: &CandidateRecord,
    options: &DetailOptions,
) -> (Option<String>, Option<String>) {
    pause(options.inter_request_delay_ms).await;
    match fetch.fetch(&reviews_url(&candidate.nhs_url)).await {
        Ok(html) => (Some(html), None),
        Err(e) => {
            tracing::warn!(id = %candidate.id, error = %e, "reviews page fetch failed");
            (None, Some(e.to_string()))
        }
    }
}

/// Fetches details for every candidate with at most
/// `options.max_concurrent` surgeries in flight.
///
/// # Errors
///
/// Returns the first [`StoreError`] encountered, after every fetch has
/// finished so that completed documents are persisted.
pub async fn fetch_details(
    fetch: &dyn Fetch,
    store: &dyn RawStore,
    candidates: &[CandidateRecord],
    options: &DetailOptions,
) -> Result<HashMap<String, StoredDetail>, StoreError> {
    let max_concurrent = options.max_concurrent.max(1);

    let results: Vec<(&CandidateRecord, Result<StoredDetail, StoreError>)> =
        stream::iter(candidates)
            .map(|c| async move { (c, fetch_detail(fetch, store, c, options).await) })
            .buffer_unordered(max_concurrent)
            .collect()
            .await;

    let mut details = HashMap::with_capacity(results.len());
    let mut first_error = None;
    for (candidate, result) in results {
        match result {
            Ok(detail) => {
                details.insert(candidate.id.clone(), detail);
            }
            Err(e) => {
                tracing::error!(id = %candidate.id, error = %e, "could not persist detail");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(details),
    }
}
