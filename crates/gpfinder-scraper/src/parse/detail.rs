//! Field parsers for the contact details and opening times page.
//!
//! Each parser reads one field from the parsed document and either returns
//! the typed value or a [`FieldError`] naming that field. Optional fields
//! (declared catchment, coordinates) return `Ok(None)` when the page simply
//! does not publish them.

use std::sync::LazyLock;

use chrono::Weekday;
use gpfinder_core::{Address, Coordinate, Field, FieldError, OpeningTimes};
use scraper::{Html, Selector};

use super::address::split_address;
use super::hours::parse_day_cell;
use super::{collapsed_text, text_nodes};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static PAGE_NAME: LazyLock<Selector> = LazyLock::new(|| selector("h2.nhsuk-caption-xl"));
static ADDRESS: LazyLock<Selector> = LazyLock::new(|| selector("address#address_panel_address"));
static PHONE: LazyLock<[Selector; 3]> = LazyLock::new(|| {
    [
        selector("#contact_info_panel_phone_link"),
        selector("#contact_info_panel_phone_text"),
        selector(r#"a[href^="tel:"]"#),
    ]
});
static WEBSITE: LazyLock<Selector> =
    LazyLock::new(|| selector("a#contact_info_panel_website_link"));
static HOURS_TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table#table_0"));
static TABLE_ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static ROW_HEADER: LazyLock<Selector> = LazyLock::new(|| selector("th"));
static ROW_CELL: LazyLock<Selector> = LazyLock::new(|| selector("td"));
static CATCHMENT: LazyLock<Selector> = LazyLock::new(|| selector("#catchment_area_postcodes"));
static COORDINATE: LazyLock<Selector> =
    LazyLock::new(|| selector("[data-latitude][data-longitude]"));

/// The surgery name shown as the page heading.
#[must_use]
pub fn parse_page_name(document: &Html) -> Option<String> {
    document
        .select(&PAGE_NAME)
        .next()
        .map(collapsed_text)
        .filter(|name| !name.is_empty())
}

/// # Errors
///
/// [`Field::Address`]: anchor missing, or the element holds no text.
pub fn parse_address(document: &Html) -> Result<Address, FieldError> {
    let element = document
        .select(&ADDRESS)
        .next()
        .ok_or(FieldError::MissingAnchor {
            field: Field::Address,
        })?;
    split_address(&text_nodes(element))
        .ok_or_else(|| FieldError::unparseable(Field::Address, "address element is empty"))
}

/// The practice phone number, from the contact panel link or text, or the
/// first `tel:` link on the page.
///
/// # Errors
///
/// [`Field::PhoneNumber`]: none of the anchors is present with a value.
pub fn parse_phone_number(document: &Html) -> Result<String, FieldError> {
    PHONE
        .iter()
        .filter_map(|sel| document.select(sel).next())
        .find_map(|el| {
            let text = collapsed_text(el);
            if !text.is_empty() {
                return Some(text);
            }
            el.value()
                .attr("href")
                .and_then(|href| href.strip_prefix("tel:"))
                .map(|number| number.trim().to_owned())
                .filter(|number| !number.is_empty())
        })
        .ok_or(FieldError::MissingAnchor {
            field: Field::PhoneNumber,
        })
}

/// # Errors
///
/// [`Field::Website`]: the link is absent or has no `href`.
pub fn parse_website(document: &Html) -> Result<String, FieldError> {
    let link = document
        .select(&WEBSITE)
        .next()
        .ok_or(FieldError::MissingAnchor {
            field: Field::Website,
        })?;
    link.value()
        .attr("href")
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| FieldError::unparseable(Field::Website, "website link has no href"))
}

/// Reads the weekly opening-hours table. Days the table does not list are
/// closed; rows whose header is not a weekday (e.g. bank holidays) are
/// ignored.
///
/// # Errors
///
/// [`Field::OpeningTimes`]: the table is absent, lists no weekdays, or a
/// cell cannot be read.
pub fn parse_opening_times(document: &Html) -> Result<OpeningTimes, FieldError> {
    let table = document
        .select(&HOURS_TABLE)
        .next()
        .ok_or(FieldError::MissingAnchor {
            field: Field::OpeningTimes,
        })?;

    let mut times = OpeningTimes::default();
    let mut seen: Vec<Weekday> = Vec::new();

    for row in table.select(&TABLE_ROW) {
        let (Some(header), Some(cell)) = (
            row.select(&ROW_HEADER).next(),
            row.select(&ROW_CELL).next(),
        ) else {
            continue;
        };
        let label = collapsed_text(header);
        let Ok(day) = label.parse::<Weekday>() else {
            tracing::debug!(label = %label, "ignoring non-weekday opening hours row");
            continue;
        };
        if seen.contains(&day) {
            continue;
        }
        seen.push(day);

        let ranges = parse_day_cell(&collapsed_text(cell)).map_err(|e| match e {
            FieldError::Unparseable { field, reason } => FieldError::Unparseable {
                field,
                reason: format!("{label}: {reason}"),
            },
            other @ FieldError::MissingAnchor { .. } => other,
        })?;
        times.set(day, ranges);
    }

    if seen.is_empty() {
        return Err(FieldError::unparseable(
            Field::OpeningTimes,
            "opening times table lists no weekdays",
        ));
    }
    Ok(times)
}

/// Postcode prefixes the surgery declares as its catchment area.
///
/// # Errors
///
/// [`Field::Catchment`]: the element is present but lists nothing usable.
pub fn parse_catchment_prefixes(document: &Html) -> Result<Option<Vec<String>>, FieldError> {
    let Some(element) = document.select(&CATCHMENT).next() else {
        return Ok(None);
    };
    let prefixes: Vec<String> = collapsed_text(element)
        .split([',', ';'])
        .map(|p| p.split_whitespace().collect::<String>().to_ascii_uppercase())
        .filter(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric()))
        .collect();
    if prefixes.is_empty() {
        return Err(FieldError::unparseable(
            Field::Catchment,
            "catchment area lists no postcodes",
        ));
    }
    Ok(Some(prefixes))
}

/// Coordinates published in `data-latitude`/`data-longitude` attributes.
///
/// # Errors
///
/// [`Field::Coordinate`]: the attributes are present but not valid degrees.
pub fn parse_coordinate(document: &Html) -> Result<Option<Coordinate>, FieldError> {
    let Some(element) = document.select(&COORDINATE).next() else {
        return Ok(None);
    };
    let attr = |name: &str| -> Result<f64, FieldError> {
        let raw = element.value().attr(name).unwrap_or_default().trim();
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| FieldError::unparseable(Field::Coordinate, format!("{name}=\"{raw}\"")))
    };
    let lat = attr("data-latitude")?;
    let lng = attr("data-longitude")?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(FieldError::unparseable(
            Field::Coordinate,
            format!("({lat}, {lng}) is out of range"),
        ));
    }
    Ok(Some(Coordinate { lat, lng }))
}
