//! Distance and catchment for each surgery relative to the searched postcode.

pub mod catchment;
pub mod distance;
pub mod geocode;

use gpfinder_core::{CandidateRecord, Coordinate, GeoResult, NormalizedFields, Postcode};

pub use catchment::classify;
pub use distance::haversine_miles;
pub use geocode::{Geocoder, PostcodesIoGeocoder, StoreBackedGeocoder};

/// Computes the [`GeoResult`] for one candidate.
///
/// The destination is the first of: coordinates published on the detail
/// page, the geocoded detail address postcode, the geocoded postcode in the
/// search snippet. When none resolves the distance is `None` and the reason
/// is recorded; the row is never failed.
pub async fn locate_surgery(
    geocoder: &dyn Geocoder,
    origin_postcode: &Postcode,
    origin: Coordinate,
    candidate: &CandidateRecord,
    fields: Option<&NormalizedFields>,
) -> GeoResult {
    let catchment = classify(
        origin_postcode,
        fields.and_then(|f| f.catchment_prefixes.as_deref()),
        candidate.listed_in_catchment,
    );

    let mut misses: Vec<String> = Vec::new();
    let mut destination = fields.and_then(|f| f.coordinate);

    if destination.is_none() {
        let detail_postcode = fields
            .and_then(|f| f.address.as_ref())
            .and_then(|a| a.postcode.clone());
        let snippet_postcode = candidate
            .address_snippet
            .as_deref()
            .and_then(Postcode::find_in);

        let mut tried: Vec<Postcode> = Vec::new();
        for postcode in [detail_postcode, snippet_postcode].into_iter().flatten() {
            if tried.contains(&postcode) {
                continue;
            }
            match geocoder.geocode(&postcode).await {
                Ok(coordinate) => {
                    destination = Some(coordinate);
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        id = %candidate.id,
                        postcode = %postcode,
                        error = %e,
                        "could not geocode surgery postcode"
                    );
                    misses.push(e.to_string());
                }
            }
            tried.push(postcode);
        }
    }

    let distance_miles = destination.map(|d| haversine_miles(origin, d));
    let issue = match (distance_miles, misses.is_empty()) {
        (Some(_), _) => None,
        (None, true) => Some("distance unavailable: no coordinates or postcode for surgery".to_owned()),
        (None, false) => Some(format!("distance unavailable: {}", misses.join("; "))),
    };

    GeoResult {
        id: candidate.id.clone(),
        origin: origin_postcode.clone(),
        destination,
        distance_miles,
        catchment,
        issue,
    }
}
