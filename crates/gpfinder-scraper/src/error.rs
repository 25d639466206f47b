use std::path::PathBuf;

use gpfinder_core::Postcode;
use thiserror::Error;

/// Failures of the fetch capability. A timeout surfaces as [`ScraperError::Http`].
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Failures reading or writing the raw artifact store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("raw store IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures turning a postcode into coordinates.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("geocoder request failed: {0}")]
    Fetch(#[from] ScraperError),

    #[error("geocoder response for {postcode} did not parse: {source}")]
    Deserialize {
        postcode: Postcode,
        #[source]
        source: serde_json::Error,
    },

    #[error("geocoder has no coordinates for {postcode}")]
    NoCoordinates { postcode: Postcode },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures that abort a whole run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not fetch the first results page for {postcode}: {source}")]
    FirstPage {
        postcode: Postcode,
        #[source]
        source: ScraperError,
    },

    #[error("no discovery results stored for {postcode}; run `discover {postcode}` first")]
    NotDiscovered { postcode: Postcode },

    #[error("could not geocode the search postcode {postcode}: {source}")]
    OriginGeocode {
        postcode: Postcode,
        #[source]
        source: GeoError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures writing the summary table.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("could not write summary to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("could not encode opening times: {0}")]
    Encode(#[from] serde_json::Error),
}
