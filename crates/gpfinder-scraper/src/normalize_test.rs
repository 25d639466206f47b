use chrono::{TimeZone, Utc, Weekday};
use gpfinder_core::RatingSummary;

use super::*;

// -----------------------------------------------------------------------
// fixtures
// -----------------------------------------------------------------------

const CONTACT_HTML: &str = r#"<html><body>
    <h2 class="nhsuk-caption-xl">Buckingham Palace Surgery</h2>
    <address id="address_panel_address">1 The Mall<br>London<br>SW1A 1AA</address>
    <a id="contact_info_panel_phone_link" href="tel:02079301234">020 7930 1234</a>
    <a id="contact_info_panel_website_link" href="https://palace-surgery.example.nhs.uk">Website</a>
    <table id="table_0"><tbody>
      <tr><th>Monday</th><td>09:00–17:00</td></tr>
      <tr><th>Tuesday</th><td>Closed</td></tr>
    </tbody></table>
  </body></html>"#;

fn reviews_html(stars: &[u8]) -> String {
    let items: String = stars
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(r#"<li><p id="star-rating-{i}">Rated {s} stars out of 5</p></li>"#)
        })
        .collect();
    format!(
        r#"<html><head><title>Ratings and reviews</title></head><body><ol class="nhsuk-list">{items}</ol></body></html>"#
    )
}

fn make_document(contact_html: &str, reviews: Option<String>) -> RawDetailDocument {
    RawDetailDocument {
        id: "A81001".to_owned(),
        contact_html: contact_html.to_owned(),
        reviews_error: if reviews.is_none() {
            Some("page not found: https://www.nhs.uk/x/ratings-and-reviews".to_owned())
        } else {
            None
        },
        reviews_html: reviews,
        fetched_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
    }
}

// -----------------------------------------------------------------------
// normalize_detail
// -----------------------------------------------------------------------

#[test]
fn worked_example_hours_and_ratings() {
    let fields = normalize_detail(&make_document(CONTACT_HTML, Some(reviews_html(&[4, 5, 3]))));

    let times = fields.opening_times.expect("opening times parsed");
    assert_eq!(times.formatted(Weekday::Mon), vec!["09:00-17:00"]);
    assert!(times.get(Weekday::Tue).is_empty());

    let ratings = fields.ratings.expect("ratings parsed");
    assert_eq!(ratings.count, 3);
    assert!((ratings.mean - 4.0).abs() < f64::EPSILON);
    assert_eq!(ratings.min, 3);
    assert_eq!(ratings.max, 5);
}

#[test]
fn full_page_has_no_failures() {
    let fields = normalize_detail(&make_document(CONTACT_HTML, Some(reviews_html(&[5]))));
    assert!(fields.failures.is_empty(), "{:?}", fields.failures);
    assert_eq!(fields.id, "A81001");
    assert_eq!(fields.page_name.as_deref(), Some("Buckingham Palace Surgery"));
    assert_eq!(
        fields.address.as_ref().map(ToString::to_string).as_deref(),
        Some("1 The Mall, London, SW1A 1AA")
    );
    assert_eq!(fields.phone_number.as_deref(), Some("020 7930 1234"));
    assert_eq!(
        fields.website.as_deref(),
        Some("https://palace-surgery.example.nhs.uk")
    );
    assert_eq!(fields.catchment_prefixes, None);
    assert_eq!(fields.coordinate, None);
}

#[test]
fn days_without_rows_are_empty_not_null() {
    let fields = normalize_detail(&make_document(CONTACT_HTML, Some(reviews_html(&[]))));
    let times = fields.opening_times.unwrap();
    for day in [Weekday::Wed, Weekday::Thu, Weekday::Fri, Weekday::Sat, Weekday::Sun] {
        assert!(times.get(day).is_empty());
    }
}

#[test]
fn zero_reviews_is_literal_zero() {
    let fields = normalize_detail(&make_document(CONTACT_HTML, Some(reviews_html(&[]))));
    assert_eq!(fields.ratings, Some(RatingSummary::from_ratings(&[])));
    let ratings = fields.ratings.unwrap();
    assert_eq!(ratings.count, 0);
    assert_eq!(ratings.min, 0);
    assert_eq!(ratings.max, 0);
}

#[test]
fn unavailable_reviews_page_leaves_ratings_null() {
    let fields = normalize_detail(&make_document(CONTACT_HTML, None));
    assert_eq!(fields.ratings, None);
    assert_eq!(fields.failures.len(), 1);
    assert_eq!(fields.failures[0].field(), Field::Ratings);
    assert!(fields.failures[0]
        .to_string()
        .contains("reviews page unavailable: page not found"));
}

#[test]
fn missing_anchors_null_their_fields_and_are_recorded() {
    let fields = normalize_detail(&make_document(
        "<html><body><h2 class=\"nhsuk-caption-xl\">Bare Surgery</h2></body></html>",
        Some(reviews_html(&[4])),
    ));

    assert_eq!(fields.page_name.as_deref(), Some("Bare Surgery"));
    assert!(fields.address.is_none());
    assert!(fields.phone_number.is_none());
    assert!(fields.website.is_none());
    assert!(fields.opening_times.is_none());
    assert!(fields.ratings.is_some());

    let failed: Vec<Field> = fields.failures.iter().map(FieldError::field).collect();
    assert_eq!(
        failed,
        vec![
            Field::Address,
            Field::PhoneNumber,
            Field::Website,
            Field::OpeningTimes
        ]
    );
}

#[test]
fn normalization_is_deterministic() {
    let doc = make_document(CONTACT_HTML, Some(reviews_html(&[1, 2])));
    assert_eq!(normalize_detail(&doc), normalize_detail(&doc));
}
