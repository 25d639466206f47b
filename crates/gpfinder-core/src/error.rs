use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading configuration. Always fatal before any fetch.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Rejections for postcode input that does not look like a UK postcode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostcodeError {
    #[error("postcode is empty")]
    Empty,

    #[error("\"{0}\" is not a valid UK postcode")]
    InvalidFormat(String),
}

/// A named field of a surgery detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Address,
    PhoneNumber,
    Website,
    OpeningTimes,
    Ratings,
    Catchment,
    Coordinate,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Field::Address => "address",
            Field::PhoneNumber => "phone_number",
            Field::Website => "website",
            Field::OpeningTimes => "opening_times",
            Field::Ratings => "ratings",
            Field::Catchment => "catchment",
            Field::Coordinate => "coordinate",
        };
        f.write_str(name)
    }
}

/// A field-scoped parse failure. Never fatal to the row it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldError {
    #[error("{field}: markup anchor not found")]
    MissingAnchor { field: Field },

    #[error("{field}: {reason}")]
    Unparseable { field: Field, reason: String },
}

impl FieldError {
    #[must_use]
    pub fn field(&self) -> Field {
        match self {
            FieldError::MissingAnchor { field } | FieldError::Unparseable { field, .. } => *field,
        }
    }

    pub fn unparseable(field: Field, reason: impl Into<String>) -> Self {
        FieldError::Unparseable {
            field,
            reason: reason.into(),
        }
    }
}
