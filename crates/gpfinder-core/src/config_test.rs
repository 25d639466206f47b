use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).expect("defaults should be valid");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.raw_dir, PathBuf::from("./raw"));
    assert_eq!(cfg.output_dir, PathBuf::from("./processed"));
    assert_eq!(cfg.search_base_url, DEFAULT_SEARCH_BASE_URL);
    assert_eq!(cfg.geocoder_base_url, DEFAULT_GEOCODER_BASE_URL);
    assert_eq!(cfg.request_timeout_secs, 10);
    assert_eq!(cfg.max_retries, 3);
    assert_eq!(cfg.retry_backoff_base_ms, 500);
    assert_eq!(cfg.inter_request_delay_ms, 500);
    assert_eq!(cfg.max_concurrent_fetches, 4);
    assert_eq!(cfg.max_search_pages, 20);
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = HashMap::new();
    map.insert("GPFINDER_RAW_DIR", "/tmp/raw");
    map.insert("GPFINDER_MAX_SEARCH_PAGES", "5");
    map.insert("GPFINDER_MAX_CONCURRENT_FETCHES", "8");
    map.insert("GPFINDER_SEARCH_BASE_URL", "http://localhost:9000/results/");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.raw_dir, PathBuf::from("/tmp/raw"));
    assert_eq!(cfg.max_search_pages, 5);
    assert_eq!(cfg.max_concurrent_fetches, 8);
    assert_eq!(cfg.search_base_url, "http://localhost:9000/results");
}

#[test]
fn build_app_config_clamps_zero_bounds_to_one() {
    let mut map = HashMap::new();
    map.insert("GPFINDER_MAX_SEARCH_PAGES", "0");
    map.insert("GPFINDER_MAX_CONCURRENT_FETCHES", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.max_search_pages, 1);
    assert_eq!(cfg.max_concurrent_fetches, 1);
}

#[test]
fn build_app_config_rejects_non_numeric_timeout() {
    let mut map = HashMap::new();
    map.insert("GPFINDER_REQUEST_TIMEOUT_SECS", "ten");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GPFINDER_REQUEST_TIMEOUT_SECS"),
        "expected InvalidEnvVar(GPFINDER_REQUEST_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_non_http_geocoder_url() {
    let mut map = HashMap::new();
    map.insert("GPFINDER_GEOCODER_BASE_URL", "ftp://postcodes");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "GPFINDER_GEOCODER_BASE_URL"),
        "expected InvalidEnvVar(GPFINDER_GEOCODER_BASE_URL), got: {result:?}"
    );
}

#[test]
fn debug_output_lists_fields() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let debug = format!("{cfg:?}");
    assert!(debug.contains("max_search_pages"));
    assert!(debug.contains("raw_dir"));
}
