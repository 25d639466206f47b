//! Domain types shared by the discovery, enrichment and reconciliation stages.

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::FieldError;
use crate::postcode::Postcode;

/// Weekdays in output column order.
pub const DAYS_OF_THE_WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A surgery as listed on a search results page.
///
/// One record per identifier; the first page an identifier appears on wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Directory-assigned organisation code (e.g. `"F84030"`).
    pub id: String,
    pub name: String,
    /// Absolute URL of the surgery's detail page.
    pub nhs_url: String,
    /// Address fragment shown in the result snippet.
    pub address_snippet: Option<String>,
    /// "0.4 miles away" as shown by the search UI. Diagnostic only.
    pub listed_distance_miles: Option<f64>,
    /// `Some(true)` when listed under the searched postcode's catchment,
    /// `Some(false)` when listed outside it, `None` when the page said neither.
    pub listed_in_catchment: Option<bool>,
    /// 1-based results page the record was first seen on.
    pub page: u32,
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

/// Three-valued catchment membership. `Unknown` is never reported as `Outside`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Catchment {
    Inside,
    Outside,
    Unknown,
}

impl Catchment {
    #[must_use]
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => Catchment::Inside,
            Some(false) => Catchment::Outside,
            None => Catchment::Unknown,
        }
    }

    #[must_use]
    pub fn as_flag(self) -> Option<bool> {
        match self {
            Catchment::Inside => Some(true),
            Catchment::Outside => Some(false),
            Catchment::Unknown => None,
        }
    }
}

/// A single open interval within a day, in 24-hour local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            self.open.format("%H:%M"),
            self.close.format("%H:%M")
        )
    }
}

/// Weekly opening hours. Every day is present; an empty list means closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningTimes {
    days: [Vec<TimeRange>; 7],
}

impl OpeningTimes {
    #[must_use]
    pub fn get(&self, day: Weekday) -> &[TimeRange] {
        &self.days[day.num_days_from_monday() as usize]
    }

    pub fn set(&mut self, day: Weekday, ranges: Vec<TimeRange>) {
        self.days[day.num_days_from_monday() as usize] = ranges;
    }

    /// Formatted ranges for `day`, e.g. `["08:00-12:30", "13:30-18:00"]`.
    #[must_use]
    pub fn formatted(&self, day: Weekday) -> Vec<String> {
        self.get(day).iter().map(ToString::to_string).collect()
    }
}

/// A structured postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Address lines excluding the postcode. When no postcode was found the
    /// full free text is kept in the last line.
    pub lines: Vec<String>,
    pub postcode: Option<Postcode>,
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts: Vec<String> = self.lines.clone();
        if let Some(postcode) = &self.postcode {
            parts.push(postcode.spaced());
        }
        f.write_str(&parts.join(", "))
    }
}

/// Aggregate of a surgery's individual star ratings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub count: u32,
    pub mean: f64,
    pub min: u8,
    pub max: u8,
}

impl RatingSummary {
    /// Summarises a list of ratings. An empty list yields literal zeros.
    #[must_use]
    pub fn from_ratings(ratings: &[u8]) -> Self {
        if ratings.is_empty() {
            return Self {
                count: 0,
                mean: 0.0,
                min: 0,
                max: 0,
            };
        }
        let sum: u32 = ratings.iter().map(|&r| u32::from(r)).sum();
        let count = u32::try_from(ratings.len()).unwrap_or(u32::MAX);
        Self {
            count,
            mean: f64::from(sum) / f64::from(count),
            min: ratings.iter().copied().min().unwrap_or(0),
            max: ratings.iter().copied().max().unwrap_or(0),
        }
    }
}

/// Typed fields parsed from one surgery's detail pages.
///
/// A `None` field means its markup could not be found or parsed; the
/// matching entry in `failures` says why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFields {
    pub id: String,
    /// Heading shown on the detail page.
    pub page_name: Option<String>,
    pub address: Option<Address>,
    pub phone_number: Option<String>,
    pub website: Option<String>,
    pub opening_times: Option<OpeningTimes>,
    pub ratings: Option<RatingSummary>,
    /// Postcode prefixes the surgery declares as its catchment area.
    pub catchment_prefixes: Option<Vec<String>>,
    pub coordinate: Option<Coordinate>,
    pub failures: Vec<FieldError>,
}

/// Distance and catchment classification for one surgery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoResult {
    pub id: String,
    pub origin: Postcode,
    pub destination: Option<Coordinate>,
    /// Great-circle miles from origin to destination; `None` when the
    /// destination could not be located.
    pub distance_miles: Option<f64>,
    pub catchment: Catchment,
    /// Why `distance_miles` is `None`, when it is.
    pub issue: Option<String>,
}

/// When a raw artifact was produced.
pub type Timestamp = DateTime<Utc>;
