//! Enrichment run: stored discovery → details → fields → geo → summary rows.

use std::collections::HashMap;

use gpfinder_core::{reconcile, DetailOutcome, GeoResult, Postcode, SurgerySummary};

use crate::detail::{fetch_details, DetailOptions};
use crate::discovery::{load_candidates, DiscoveryOptions};
use crate::error::PipelineError;
use crate::fetch::Fetch;
use crate::geo::{locate_surgery, Geocoder};
use crate::normalize::normalize_detail;
use crate::store::{RawStore, StoredDetail};

/// What an enrichment run produced.
#[derive(Debug, Clone)]
pub struct EnrichmentReport {
    /// One row per discovered surgery, in discovery order.
    pub rows: Vec<SurgerySummary>,
    /// Surgeries whose detail fetch has failed.
    pub tombstones: usize,
    /// Rows with at least one recorded issue.
    pub rows_with_issues: usize,
}

/// Builds the summary rows for `postcode` from its stored discovery pages.
///
/// Row-scoped problems (tombstones, unparsed fields, unlocatable surgeries)
/// are recorded on the rows; only run-scoped failures are errors.
///
/// # Errors
///
/// - [`PipelineError::NotDiscovered`] if discovery has not been run.
/// - [`PipelineError::OriginGeocode`] if `postcode` cannot be geocoded.
/// - [`PipelineError::Store`] if the raw store fails.
pub async fn run_enrichment(
    fetch: &dyn Fetch,
    store: &dyn RawStore,
    geocoder: &dyn Geocoder,
    postcode: &Postcode,
    discovery: &DiscoveryOptions,
    detail: &DetailOptions,
) -> Result<EnrichmentReport, PipelineError> {
    let candidates = load_candidates(store, postcode, discovery).await?;
    tracing::info!(postcode = %postcode, candidates = candidates.len(), "loaded discovery results");

    let origin = geocoder
        .geocode(postcode)
        .await
        .map_err(|source| PipelineError::OriginGeocode {
            postcode: postcode.clone(),
            source,
        })?;

    let stored = fetch_details(fetch, store, &candidates, detail).await?;

    let mut outcomes: HashMap<String, DetailOutcome> = HashMap::with_capacity(stored.len());
    let mut tombstones = 0usize;
    for candidate in &candidates {
        let outcome = match stored.get(&candidate.id) {
            Some(StoredDetail::Document(doc)) => {
                let fields = normalize_detail(doc);
                if let Some(page_name) = &fields.page_name {
                    if page_name != &candidate.name {
                        tracing::warn!(
                            id = %candidate.id,
                            listed = %candidate.name,
                            detail = %page_name,
                            "detail page name differs from search listing"
                        );
                    }
                }
                DetailOutcome::Normalized(fields)
            }
            Some(StoredDetail::Tombstone(tombstone)) => {
                tombstones += 1;
                DetailOutcome::Missing {
                    reason: tombstone.reason.clone(),
                }
            }
            None => continue,
        };
        outcomes.insert(candidate.id.clone(), outcome);
    }

    let mut geo: HashMap<String, GeoResult> = HashMap::with_capacity(candidates.len());
    for candidate in &candidates {
        let fields = match outcomes.get(&candidate.id) {
            Some(DetailOutcome::Normalized(fields)) => Some(fields),
            _ => None,
        };
        let result = locate_surgery(geocoder, postcode, origin, candidate, fields).await;
        geo.insert(candidate.id.clone(), result);
    }

    let rows = reconcile(&candidates, &outcomes, &geo);
    let rows_with_issues = rows.iter().filter(|r| !r.issues.is_empty()).count();
    for row in rows.iter().filter(|r| !r.issues.is_empty()) {
        tracing::debug!(id = %row.id, issues = ?row.issues, "row enriched with issues");
    }
    tracing::info!(
        postcode = %postcode,
        rows = rows.len(),
        tombstones,
        rows_with_issues,
        "enrichment complete"
    );

    Ok(EnrichmentReport {
        rows,
        tombstones,
        rows_with_issues,
    })
}
