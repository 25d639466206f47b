pub mod app_config;
pub mod config;
pub mod error;
pub mod postcode;
pub mod summary;
pub mod types;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, Field, FieldError, PostcodeError};
pub use postcode::Postcode;
pub use summary::{reconcile, DetailOutcome, SurgerySummary, SUMMARY_COLUMNS};
pub use types::{
    Address, CandidateRecord, Catchment, Coordinate, GeoResult, NormalizedFields, OpeningTimes,
    RatingSummary, TimeRange, Timestamp, DAYS_OF_THE_WEEK,
};
