//! Discovery: the ordered, deduplicated candidate list for a postcode.
//!
//! Result pages are walked sequentially. Each fetched page is persisted to
//! the raw store before it is parsed, and a stored page is reused instead
//! of refetched, so an interrupted discovery resumes where it stopped.

use std::collections::HashSet;

use gpfinder_core::{CandidateRecord, Postcode};

use crate::client::search_page_url;
use crate::error::PipelineError;
use crate::fetch::Fetch;
use crate::pagination::{PageCursor, StopReason};
use crate::parse::search::parse_search_page;
use crate::rate_limit::pause;
use crate::store::{RawStore, StoreKey};

/// Knobs for the page walk.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Results endpoint; the postcode is appended as a path segment.
    pub search_base_url: String,
    pub max_pages: u32,
    pub inter_request_delay_ms: u64,
}

/// Candidates in first-seen order, one per identifier.
#[derive(Debug, Default)]
pub struct CandidateSet {
    seen: HashSet<String>,
    records: Vec<CandidateRecord>,
}

impl CandidateSet {
    /// Appends the records whose identifiers are new and returns how many
    /// were added. A repeated identifier keeps its first record.
    pub fn extend_from_page(&mut self, candidates: Vec<CandidateRecord>) -> usize {
        let before = self.records.len();
        for candidate in candidates {
            if self.seen.contains(&candidate.id) {
                tracing::warn!(
                    id = %candidate.id,
                    page = candidate.page,
                    "duplicate surgery identifier in search results; keeping first occurrence"
                );
                continue;
            }
            self.seen.insert(candidate.id.clone());
            self.records.push(candidate);
        }
        self.records.len() - before
    }

    #[must_use]
    pub fn into_records(self) -> Vec<CandidateRecord> {
        self.records
    }
}

/// Walks the search results for `postcode`, fetching pages that are not yet
/// stored.
///
/// A failure on a later page ends the walk with the candidates collected so
/// far.
///
/// # Errors
///
/// - [`PipelineError::FirstPage`] if page 1 cannot be fetched.
/// - [`PipelineError::Store`] if the raw store cannot be read or written.
pub async fn discover(
    fetch: &dyn Fetch,
    store: &dyn RawStore,
    postcode: &Postcode,
    options: &DiscoveryOptions,
) -> Result<Vec<CandidateRecord>, PipelineError> {
    walk_pages(Some(fetch), store, postcode, options).await
}

/// Rebuilds the candidate list from stored pages only, without network
/// access. Parsing identical stored pages always yields the same list.
///
/// # Errors
///
/// - [`PipelineError::NotDiscovered`] if page 1 is not stored.
/// - [`PipelineError::Store`] if the raw store cannot be read.
pub async fn load_candidates(
    store: &dyn RawStore,
    postcode: &Postcode,
    options: &DiscoveryOptions,
) -> Result<Vec<CandidateRecord>, PipelineError> {
    walk_pages(None, store, postcode, options).await
}

async fn walk_pages(
    fetch: Option<&dyn Fetch>,
    store: &dyn RawStore,
    postcode: &Postcode,
    options: &DiscoveryOptions,
) -> Result<Vec<CandidateRecord>, PipelineError> {
    let mut cursor = PageCursor::new(options.max_pages);
    let mut candidates = CandidateSet::default();

    while let Some(page) = cursor.current() {
        let Some((url, html)) = page_html(fetch, store, postcode, page, options).await? else {
            cursor.abandon();
            break;
        };

        let parsed = parse_search_page(&html, &url, page);
        let found = parsed.candidates.len();
        let added = candidates.extend_from_page(parsed.candidates);
        tracing::info!(postcode = %postcode, page, found, added, "parsed results page");

        if cursor.advance(added, parsed.has_next) == Some(StopReason::PageLimit) {
            tracing::warn!(
                postcode = %postcode,
                max_pages = options.max_pages,
                "stopped at the page limit; later results were not read"
            );
        }
    }

    Ok(candidates.into_records())
}

/// The URL and markup of `page`, from the store or, when `fetch` is given,
/// the network. `Ok(None)` ends the walk.
async fn page_html(
    fetch: Option<&dyn Fetch>,
    store: &dyn RawStore,
    postcode: &Postcode,
    page: u32,
    options: &DiscoveryOptions,
) -> Result<Option<(String, String)>, PipelineError> {
    let url = match search_page_url(&options.search_base_url, postcode, page) {
        Ok(url) => url,
        Err(source) => {
            return Err(PipelineError::FirstPage {
                postcode: postcode.clone(),
                source,
            })
        }
    };

    let key = StoreKey::SearchPage {
        postcode: postcode.clone(),
        page,
    };
    if let Some(bytes) = store.get(&key).await? {
        tracing::debug!(postcode = %postcode, page, "results page cache hit");
        return Ok(Some((url, String::from_utf8_lossy(&bytes).into_owned())));
    }

    let Some(fetch) = fetch else {
        if page == 1 {
            return Err(PipelineError::NotDiscovered {
                postcode: postcode.clone(),
            });
        }
        return Ok(None);
    };

    pause(options.inter_request_delay_ms).await;
    match fetch.fetch(&url).await {
        Ok(html) => {
            store.put(&key, html.as_bytes()).await?;
            Ok(Some((url, html)))
        }
        Err(source) if page == 1 => Err(PipelineError::FirstPage {
            postcode: postcode.clone(),
            source,
        }),
        Err(e) => {
            tracing::warn!(
                postcode = %postcode,
                page,
                error = %e,
                "results page fetch failed; keeping candidates found so far"
            );
            Ok(None)
        }
    }
}
