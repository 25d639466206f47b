//! Command handlers for the CLI.
//!
//! Called from `main` once configuration is loaded and logging is set up.
//! Run-scoped failures propagate as errors and end the process non-zero;
//! row-scoped problems are counted and reported, never propagated.

use std::sync::Arc;

use anyhow::Context;
use gpfinder_core::{AppConfig, Postcode};
use gpfinder_scraper::{
    DetailOptions, DirectoryClient, DiscoveryOptions, FsRawStore, PostcodesIoGeocoder, RawStore,
    StoreBackedGeocoder,
};

fn build_client(config: &AppConfig) -> anyhow::Result<Arc<DirectoryClient>> {
    let client = DirectoryClient::new(
        config.request_timeout_secs,
        &config.user_agent,
        config.max_retries,
        config.retry_backoff_base_ms,
    )
    .context("failed to build HTTP client")?;
    Ok(Arc::new(client))
}

fn discovery_options(config: &AppConfig) -> DiscoveryOptions {
    DiscoveryOptions {
        search_base_url: config.search_base_url.clone(),
        max_pages: config.max_search_pages,
        inter_request_delay_ms: config.inter_request_delay_ms,
    }
}

/// Walk the search results for `postcode` and store every page under the
/// raw directory.
///
/// # Errors
///
/// Returns an error if the first results page cannot be fetched or the raw
/// store cannot be written.
pub(crate) async fn run_discover(config: &AppConfig, postcode: &Postcode) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let store = FsRawStore::new(&config.raw_dir);

    let candidates = gpfinder_scraper::discover(
        client.as_ref(),
        &store,
        postcode,
        &discovery_options(config),
    )
    .await?;

    if candidates.is_empty() {
        println!("No GP surgeries found for {postcode}");
    } else {
        println!(
            "Discovered {} GP surgeries for {postcode}; pages stored under {}",
            candidates.len(),
            config.raw_dir.display()
        );
    }
    Ok(())
}

/// Enrich the surgeries discovered for `postcode` and write the summary table.
///
/// # Errors
///
/// Returns an error if discovery has not been run, the postcode cannot be
/// geocoded, the raw store fails, or the table cannot be written.
pub(crate) async fn run_summarise(
    config: &AppConfig,
    postcode: &Postcode,
    retry_failed: bool,
) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let store: Arc<dyn RawStore> = Arc::new(FsRawStore::new(&config.raw_dir));
    let geocoder = StoreBackedGeocoder::new(
        PostcodesIoGeocoder::new(client.clone(), config.geocoder_base_url.clone()),
        Arc::clone(&store),
    );
    let detail_options = DetailOptions {
        inter_request_delay_ms: config.inter_request_delay_ms,
        max_concurrent: config.max_concurrent_fetches,
        retry_failed,
    };

    let report = gpfinder_scraper::run_enrichment(
        client.as_ref(),
        store.as_ref(),
        &geocoder,
        postcode,
        &discovery_options(config),
        &detail_options,
    )
    .await?;

    let path = config
        .output_dir
        .join(gpfinder_scraper::summary_file_name(postcode));
    gpfinder_scraper::write_summary_csv(&path, &report.rows)
        .with_context(|| format!("failed to write {}", path.display()))?;

    if report.rows.is_empty() {
        println!("No GP surgeries found for {postcode}");
        return Ok(());
    }
    println!(
        "Wrote {} surgeries to {} ({} without detail pages, {} with issues)",
        report.rows.len(),
        path.display(),
        report.tombstones,
        report.rows_with_issues
    );
    Ok(())
}
