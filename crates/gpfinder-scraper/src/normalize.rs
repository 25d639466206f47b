//! Raw detail document → typed fields.
//!
//! [`normalize_detail`] runs every field parser in a fixed order and keeps
//! going when one fails: the failed field is left `None` and its error is
//! collected on [`NormalizedFields::failures`]. No default value is ever
//! substituted for a field that could not be read.

use gpfinder_core::{Field, FieldError, NormalizedFields};
use scraper::Html;

use crate::parse::detail::{
    parse_address, parse_catchment_prefixes, parse_coordinate, parse_opening_times,
    parse_page_name, parse_phone_number, parse_website,
};
use crate::parse::reviews::parse_ratings;
use crate::store::RawDetailDocument;

/// Parses both detail pages of `doc` into [`NormalizedFields`].
///
/// Pure: the same document always produces the same fields.
#[must_use]
pub fn normalize_detail(doc: &RawDetailDocument) -> NormalizedFields {
    let contact = Html::parse_document(&doc.contact_html);
    let mut failures = Vec::new();

    let page_name = parse_page_name(&contact);
    let address = keep_or_record(&doc.id, &mut failures, parse_address(&contact));
    let phone_number = keep_or_record(&doc.id, &mut failures, parse_phone_number(&contact));
    let website = keep_or_record(&doc.id, &mut failures, parse_website(&contact));
    let opening_times = keep_or_record(&doc.id, &mut failures, parse_opening_times(&contact));
    let catchment_prefixes =
        keep_or_record(&doc.id, &mut failures, parse_catchment_prefixes(&contact)).flatten();
    let coordinate = keep_or_record(&doc.id, &mut failures, parse_coordinate(&contact)).flatten();

    let ratings = match &doc.reviews_html {
        Some(html) => keep_or_record(&doc.id, &mut failures, parse_ratings(html)),
        None => {
            let reason = doc.reviews_error.as_deref().unwrap_or("not fetched");
            keep_or_record::<()>(
                &doc.id,
                &mut failures,
                Err(FieldError::unparseable(
                    Field::Ratings,
                    format!("reviews page unavailable: {reason}"),
                )),
            );
            None
        }
    };

    NormalizedFields {
        id: doc.id.clone(),
        page_name,
        address,
        phone_number,
        website,
        opening_times,
        ratings,
        catchment_prefixes,
        coordinate,
        failures,
    }
}

fn keep_or_record<T>(
    id: &str,
    failures: &mut Vec<FieldError>,
    result: Result<T, FieldError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(id, field = %error.field(), error = %error, "detail field not parsed");
            failures.push(error);
            None
        }
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
