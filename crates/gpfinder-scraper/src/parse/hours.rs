//! Opening-hours cell parsing.
//!
//! Accepts the formats the directory has been seen to use:
//! `08:00–18:30`, `08:00 - 18:30`, `08:00 to 18:30`, `8am to 6:30pm`,
//! `9:00am until 12 noon`, and several ranges in one cell. A cell that is
//! empty or starts with "Closed" is an empty list. A closing time of
//! `24:00` means end of day and is stored as `23:59`.

use std::sync::LazyLock;

use chrono::NaiveTime;
use gpfinder_core::{Field, FieldError, TimeRange};
use regex::Regex;

const TIME_PATTERN: &str = r"(?:12\s*(?:noon|midday)|noon|midday|\d{1,2}[:.]\d{2}\s*(?:am|pm)?|\d{1,2}\s*(?:am|pm))";

static RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?P<open>{TIME_PATTERN})\s*(?:-|to|until|till)\s*(?P<close>{TIME_PATTERN})"
    ))
    .expect("valid opening hours regex")
});

static CLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<hour>\d{1,2})(?:[:.](?P<minute>\d{2}))?\s*(?P<meridiem>am|pm)?$")
        .expect("valid clock regex")
});

/// Parses the text of one weekday's cell into ordered open intervals.
///
/// # Errors
///
/// Returns [`FieldError::Unparseable`] for [`Field::OpeningTimes`] when the
/// cell has text that is neither "closed" nor a recognisable time range, or
/// a range that closes before it opens.
pub fn parse_day_cell(raw: &str) -> Result<Vec<TimeRange>, FieldError> {
    let text = normalize(raw);
    if text.is_empty() || text.starts_with("closed") {
        return Ok(Vec::new());
    }

    let mut ranges = Vec::new();
    for caps in RANGE.captures_iter(&text) {
        let open = parse_clock(&caps["open"])?;
        let close = match caps["close"].trim() {
            "24:00" | "24.00" => end_of_day(),
            token => parse_clock(token)?,
        };
        if close <= open {
            return Err(FieldError::unparseable(
                Field::OpeningTimes,
                format!("range closes before it opens: \"{}\"", raw.trim()),
            ));
        }
        ranges.push(TimeRange { open, close });
    }

    if ranges.is_empty() && !text.contains("closed") {
        return Err(FieldError::unparseable(
            Field::OpeningTimes,
            format!("unrecognised opening hours \"{}\"", raw.trim()),
        ));
    }
    Ok(ranges)
}

/// Lower-cases, folds dash variants to `-`, and collapses whitespace.
fn normalize(raw: &str) -> String {
    raw.to_lowercase()
        .replace(['\u{2012}', '\u{2013}', '\u{2014}', '\u{2212}'], "-")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default()
}

fn parse_clock(token: &str) -> Result<NaiveTime, FieldError> {
    let token = token.trim();
    let invalid = || FieldError::unparseable(Field::OpeningTimes, format!("invalid time \"{token}\""));
    if token.contains("noon") || token.contains("midday") {
        return NaiveTime::from_hms_opt(12, 0, 0).ok_or_else(invalid);
    }

    let caps = CLOCK.captures(token).ok_or_else(invalid)?;
    let hour: u32 = caps["hour"].parse().map_err(|_| invalid())?;
    let minute: u32 = caps
        .name("minute")
        .map_or(Ok(0), |m| m.as_str().parse())
        .map_err(|_| invalid())?;

    let hour = match caps.name("meridiem").map(|m| m.as_str()) {
        Some(_) if !(1..=12).contains(&hour) => return Err(invalid()),
        Some("am") => hour % 12,
        Some(_) => hour % 12 + 12,
        None => hour,
    };
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}
