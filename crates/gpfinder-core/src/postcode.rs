//! UK postcode normalization and validation.
//!
//! A [`Postcode`] is stored in its compact form: whitespace stripped and
//! upper-cased (`"sw1a 1aa"` becomes `"SW1A1AA"`). The last three characters
//! are always the inward code; everything before them is the outward code.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PostcodeError;

static COMPACT_POSTCODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:GIR0AA|[A-Z]{1,2}[0-9][A-Z0-9]?[0-9][ABD-HJLNP-UW-Z]{2})$")
        .expect("valid postcode regex")
});

static POSTCODE_IN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([A-Z]{1,2}[0-9][A-Z0-9]?)\s*([0-9][A-Z]{2})\b")
        .expect("valid postcode search regex")
});

/// A validated UK postcode in compact form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Postcode(String);

impl Postcode {
    /// Normalizes and validates a raw postcode string.
    ///
    /// # Errors
    ///
    /// Returns [`PostcodeError::Empty`] for blank input and
    /// [`PostcodeError::InvalidFormat`] when the compact form does not match
    /// the UK lexical pattern.
    pub fn parse(raw: &str) -> Result<Self, PostcodeError> {
        let compact: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();
        if compact.is_empty() {
            return Err(PostcodeError::Empty);
        }
        if !COMPACT_POSTCODE.is_match(&compact) {
            return Err(PostcodeError::InvalidFormat(raw.trim().to_owned()));
        }
        Ok(Self(compact))
    }

    /// Finds the last postcode-shaped token in free text, e.g. the trailing
    /// postcode of an address line.
    #[must_use]
    pub fn find_in(text: &str) -> Option<Self> {
        POSTCODE_IN_TEXT
            .captures_iter(text)
            .filter_map(|caps| {
                let candidate = format!("{}{}", &caps[1], &caps[2]);
                Self::parse(&candidate).ok()
            })
            .last()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The district part, e.g. `"SW1A"` for `"SW1A1AA"`.
    #[must_use]
    pub fn outward(&self) -> &str {
        &self.0[..self.0.len() - 3]
    }

    #[must_use]
    pub fn inward(&self) -> &str {
        &self.0[self.0.len() - 3..]
    }

    /// The conventional display form with a single space, e.g. `"SW1A 1AA"`.
    #[must_use]
    pub fn spaced(&self) -> String {
        format!("{} {}", self.outward(), self.inward())
    }

    /// Whether this postcode falls under `prefix`, which may be an area
    /// (`"SW"`), a district (`"SW1A"`), a sector (`"SW1A 1"`) or a full
    /// postcode. District prefixes must match the whole outward code so that
    /// `"SW1"` does not claim `"SW1A"`.
    #[must_use]
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        let prefix: String = prefix
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();
        if prefix.is_empty() {
            return false;
        }
        let outward = self.outward();
        if prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            // Area only: the alphabetic run of the outward code.
            let area: String = outward
                .chars()
                .take_while(char::is_ascii_alphabetic)
                .collect();
            return area == prefix;
        }
        if prefix.len() <= outward.len() {
            return outward == prefix;
        }
        self.0.starts_with(&prefix) && prefix.starts_with(outward)
    }
}

impl std::fmt::Display for Postcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Postcode {
    type Err = PostcodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Postcode {
    type Error = PostcodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Postcode> for String {
    fn from(value: Postcode) -> Self {
        value.0
    }
}
