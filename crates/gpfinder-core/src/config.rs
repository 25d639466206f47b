use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::ConfigError;

const DEFAULT_SEARCH_BASE_URL: &str = "https://www.nhs.uk/service-search/find-a-gp/results";
const DEFAULT_GEOCODER_BASE_URL: &str = "https://api.postcodes.io";
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Reads [`AppConfig`] from the environment after loading any `.env` file.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Reads [`AppConfig`] from the process environment only; `.env` is ignored.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Builds the config from `lookup`, which stands in for `std::env::var`.
///
/// Every variable has a default, so an empty environment yields a usable
/// config. Numeric bounds that must be at least one are clamped, not rejected.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_url = |var: &str, default: &str| -> Result<String, ConfigError> {
        let raw = or_default(var, default);
        let trimmed = raw.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("\"{raw}\" is not an http(s) URL"),
            });
        }
        Ok(trimmed.to_string())
    };

    let log_level = or_default("GPFINDER_LOG_LEVEL", "info");
    let raw_dir = PathBuf::from(or_default("GPFINDER_RAW_DIR", "./raw"));
    let output_dir = PathBuf::from(or_default("GPFINDER_OUTPUT_DIR", "./processed"));
    let search_base_url = parse_url("GPFINDER_SEARCH_BASE_URL", DEFAULT_SEARCH_BASE_URL)?;
    let geocoder_base_url = parse_url("GPFINDER_GEOCODER_BASE_URL", DEFAULT_GEOCODER_BASE_URL)?;

    let request_timeout_secs = parse_number(&or_default, "GPFINDER_REQUEST_TIMEOUT_SECS", "10")?;
    let user_agent = or_default("GPFINDER_USER_AGENT", DEFAULT_USER_AGENT);
    let max_retries = parse_number(&or_default, "GPFINDER_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_number(&or_default, "GPFINDER_RETRY_BACKOFF_BASE_MS", "500")?;
    let inter_request_delay_ms =
        parse_number(&or_default, "GPFINDER_INTER_REQUEST_DELAY_MS", "500")?;
    let max_concurrent_fetches: usize =
        parse_number(&or_default, "GPFINDER_MAX_CONCURRENT_FETCHES", "4")?;
    let max_search_pages: u32 = parse_number(&or_default, "GPFINDER_MAX_SEARCH_PAGES", "20")?;

    Ok(AppConfig {
        log_level,
        raw_dir,
        output_dir,
        search_base_url,
        geocoder_base_url,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        inter_request_delay_ms,
        max_concurrent_fetches: max_concurrent_fetches.max(1),
        max_search_pages: max_search_pages.max(1),
    })
}

/// Reads `var` through `or_default` and parses it as a number.
fn parse_number<T>(
    or_default: &impl Fn(&str, &str) -> String,
    var: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    or_default(var, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
