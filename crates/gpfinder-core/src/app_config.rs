use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub raw_dir: PathBuf,
    pub output_dir: PathBuf,
    pub search_base_url: String,
    pub geocoder_base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub inter_request_delay_ms: u64,
    pub max_concurrent_fetches: usize,
    pub max_search_pages: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("raw_dir", &self.raw_dir)
            .field("output_dir", &self.output_dir)
            .field("search_base_url", &self.search_base_url)
            .field("geocoder_base_url", &self.geocoder_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("max_concurrent_fetches", &self.max_concurrent_fetches)
            .field("max_search_pages", &self.max_search_pages)
            .finish()
    }
}
