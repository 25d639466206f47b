//! Ratings page parsing.

use std::sync::LazyLock;

use gpfinder_core::{Field, FieldError, RatingSummary};
use regex::Regex;
use scraper::{Html, Selector};

use super::collapsed_text;

static STAR_RATING: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"ol.nhsuk-list li p[id^="star-rating-"]"#).expect("valid selector")
});
static PAGE_HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title, h1").expect("valid selector"));

static RATED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Rated\s+(\d+)\s+star").expect("valid rating regex"));

/// Parses every individual star rating in the review list and summarises them.
///
/// Ratings outside `ol.nhsuk-list` (page-level aggregates) are ignored.
///
/// A genuine ratings page with no reviews yields a zero summary. A page
/// with neither ratings nor a reviews heading is a [`FieldError::MissingAnchor`].
///
/// # Errors
///
/// Returns a [`Field::Ratings`] error when the page is not a ratings page or
/// a rating element does not read "Rated N stars" with N from 1 to 5.
pub fn parse_ratings(html: &str) -> Result<RatingSummary, FieldError> {
    let document = Html::parse_document(html);
    let mut ratings = Vec::new();

    for element in document.select(&STAR_RATING) {
        let text = collapsed_text(element);
        let rating = RATED
            .captures(&text)
            .and_then(|caps| caps[1].parse::<u8>().ok())
            .filter(|r| (1..=5).contains(r))
            .ok_or_else(|| {
                FieldError::unparseable(Field::Ratings, format!("unreadable rating \"{text}\""))
            })?;
        ratings.push(rating);
    }

    if ratings.is_empty() {
        let is_reviews_page = document
            .select(&PAGE_HEADING)
            .any(|el| collapsed_text(el).to_lowercase().contains("review"));
        if !is_reviews_page {
            return Err(FieldError::MissingAnchor {
                field: Field::Ratings,
            });
        }
    }

    Ok(RatingSummary::from_ratings(&ratings))
}
