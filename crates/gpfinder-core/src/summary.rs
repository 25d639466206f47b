//! Reconciliation of discovery, enrichment and geo outputs into summary rows.
//!
//! [`reconcile`] is a left outer join keyed on the candidate identifier:
//! every [`CandidateRecord`] yields exactly one [`SurgerySummary`], in
//! discovery order, whether or not the other two datasets have an entry for
//! it. Upstream values are only read, never modified.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{
    CandidateRecord, Catchment, GeoResult, NormalizedFields, OpeningTimes, RatingSummary,
};

/// Output columns, in order.
pub const SUMMARY_COLUMNS: [&str; 19] = [
    "id",
    "name",
    "nhs_url",
    "address",
    "phone_number",
    "distance_miles",
    "is_in_catchment",
    "website",
    "opening_times_monday",
    "opening_times_tuesday",
    "opening_times_wednesday",
    "opening_times_thursday",
    "opening_times_friday",
    "opening_times_saturday",
    "opening_times_sunday",
    "num_reviews",
    "avg_rating",
    "min_rating",
    "max_rating",
];

/// What the enrichment stage produced for one identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailOutcome {
    Normalized(NormalizedFields),
    /// The detail fetch tombstoned; nothing to enrich with.
    Missing { reason: String },
}

/// One final output row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurgerySummary {
    pub id: String,
    pub name: String,
    pub nhs_url: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub distance_miles: Option<f64>,
    pub is_in_catchment: Catchment,
    pub website: Option<String>,
    pub opening_times: Option<OpeningTimes>,
    pub ratings: Option<RatingSummary>,
    /// Row-scoped problems encountered while enriching this row.
    pub issues: Vec<String>,
}

impl SurgerySummary {
    fn bare(candidate: &CandidateRecord) -> Self {
        Self {
            id: candidate.id.clone(),
            name: candidate.name.clone(),
            nhs_url: candidate.nhs_url.clone(),
            address: candidate.address_snippet.clone(),
            phone_number: None,
            distance_miles: None,
            is_in_catchment: Catchment::Unknown,
            website: None,
            opening_times: None,
            ratings: None,
            issues: Vec::new(),
        }
    }
}

/// Joins candidates with their enrichment and geo results.
///
/// The detail page address takes precedence over the search snippet; the
/// snippet is kept when the detail is missing or its address did not parse.
#[must_use]
pub fn reconcile(
    candidates: &[CandidateRecord],
    details: &HashMap<String, DetailOutcome>,
    geo: &HashMap<String, GeoResult>,
) -> Vec<SurgerySummary> {
    candidates
        .iter()
        .map(|candidate| {
            let mut row = SurgerySummary::bare(candidate);

            match details.get(&candidate.id) {
                Some(DetailOutcome::Normalized(fields)) => {
                    if let Some(address) = &fields.address {
                        row.address = Some(address.to_string());
                    }
                    row.phone_number.clone_from(&fields.phone_number);
                    row.website.clone_from(&fields.website);
                    row.opening_times.clone_from(&fields.opening_times);
                    row.ratings = fields.ratings;
                    row.issues.extend(fields.failures.iter().map(ToString::to_string));
                }
                Some(DetailOutcome::Missing { reason }) => {
                    row.issues.push(format!("detail unavailable: {reason}"));
                }
                None => row.issues.push("detail not fetched".to_owned()),
            }

            match geo.get(&candidate.id) {
                Some(result) => {
                    row.distance_miles = result.distance_miles;
                    row.is_in_catchment = result.catchment;
                    if let Some(issue) = &result.issue {
                        row.issues.push(issue.clone());
                    }
                }
                None => row.issues.push("no geo result".to_owned()),
            }

            row
        })
        .collect()
}

#[cfg(test)]
#[path = "summary_test.rs"]
mod tests;
