//! End-to-end enrichment against a mock directory and postcode service.
//!
//! Discovers three surgeries, enriches them (one contact page is missing,
//! one ratings page is missing), writes the summary table, then replays the
//! run from the raw store with the mock server emptied.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gpfinder_core::{Postcode, SUMMARY_COLUMNS};
use gpfinder_scraper::{
    discover, run_enrichment, write_summary_csv, DetailOptions, DirectoryClient,
    DiscoveryOptions, FsRawStore, PipelineError, PostcodesIoGeocoder, RawStore,
    StoreBackedGeocoder, StoredDetail,
};

const RESULTS_PATH: &str = "/service-search/find-a-gp/results/E32LR";

// ---------------------------------------------------------------------------
// fixtures
// ---------------------------------------------------------------------------

fn results_html() -> String {
    let item = |id: &str, name: &str, address: &str| {
        format!(
            r#"<li class="results__item">
                 <p class="nhsuk-u-visually-hidden" id="item_id_{id}">{id}</p>
                 <h2 class="results__name"><a href="/services/gp-surgery/s/{id}">{name}</a></h2>
                 <p id="address_{id}"><span class="nhsuk-u-visually-hidden">Address for this organisation is</span>{address}</p>
                 <p id="distance_{id}">0.3 miles away</p>
               </li>"#
        )
    };
    format!(
        r#"<html><body>
             <ol id="catchment_gps_list">{}{}</ol>
             <ol id="non_catchment_gps_list">{}</ol>
           </body></html>"#,
        item("A11111", "Ruston Street Clinic", "1 Ruston Street, London, E3 2LR"),
        item("C33333", "Parnell Road Surgery", "3 Parnell Road, London, E3 5BB"),
        item("B22222", "Bow Health Centre", "2 Roman Road, London, E3 4AA"),
    )
}

const CONTACT_A: &str = r#"<html><body>
    <h2 class="nhsuk-caption-xl">Ruston Street Clinic</h2>
    <address id="address_panel_address">1 Ruston Street<br>London<br>E3 2LR</address>
    <a id="contact_info_panel_phone_link" href="tel:02089801000">020 8980 1000</a>
    <a id="contact_info_panel_website_link" href="https://ruston.example.nhs.uk">Website</a>
    <div id="map" data-latitude="51.5290" data-longitude="-0.0230"></div>
    <table id="table_0"><tbody>
      <tr><th>Monday</th><td>09:00-17:00</td></tr>
      <tr><th>Tuesday</th><td>Closed</td></tr>
      <tr><th>Wednesday</th><td>08:00 to 12:30 14:00 to 18:00</td></tr>
    </tbody></table>
  </body></html>"#;

const CONTACT_B: &str = r#"<html><body>
    <h2 class="nhsuk-caption-xl">Bow Health Centre</h2>
    <address id="address_panel_address">2 Roman Road<br>London<br>E3 4AA</address>
    <a id="contact_info_panel_phone_link" href="tel:02089802000">020 8980 2000</a>
    <p id="catchment_area_postcodes">E3, E14</p>
    <table id="table_0"><tbody>
      <tr><th>Monday</th><td>08:30-18:30</td></tr>
    </tbody></table>
  </body></html>"#;

const CONTACT_C: &str = r#"<html><body>
    <h2 class="nhsuk-caption-xl">Parnell Road Surgery</h2>
    <address id="address_panel_address">3 Parnell Road<br>London<br>E3 5BB</address>
    <a id="contact_info_panel_phone_link" href="tel:02089803000">020 8980 3000</a>
    <table id="table_0"><tbody>
      <tr><th>Friday</th><td>09:00-13:00</td></tr>
    </tbody></table>
  </body></html>"#;

fn reviews_html(stars: &[u8]) -> String {
    let items: String = stars
        .iter()
        .enumerate()
        .map(|(i, s)| format!(r#"<li><p id="star-rating-{i}">Rated {s} stars out of 5</p></li>"#))
        .collect();
    format!(
        r#"<html><head><title>Ratings and reviews</title></head><body><ol class="nhsuk-list">{items}</ol></body></html>"#
    )
}

async fn mount_html(server: &MockServer, at: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_postcode(server: &MockServer, compact: &str, lat: f64, lng: f64) {
    Mock::given(method("GET"))
        .and(path(format!("/postcodes/{compact}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 200,
            "result": { "latitude": lat, "longitude": lng }
        })))
        .mount(server)
        .await;
}

async fn mount_directory(server: &MockServer) {
    mount_html(server, RESULTS_PATH, 200, &results_html()).await;

    let detail = |id: &str, page: &str| format!("/services/gp-surgery/s/{id}/{page}");
    mount_html(server, &detail("A11111", "contact-details-and-opening-times"), 200, CONTACT_A).await;
    mount_html(server, &detail("A11111", "ratings-and-reviews"), 200, &reviews_html(&[4, 5, 3])).await;
    mount_html(server, &detail("B22222", "contact-details-and-opening-times"), 200, CONTACT_B).await;
    mount_html(server, &detail("B22222", "ratings-and-reviews"), 404, "").await;
    mount_html(server, &detail("C33333", "contact-details-and-opening-times"), 404, "").await;

    mount_postcode(server, "E32LR", 51.5290, -0.0230).await;
    mount_postcode(server, "E34AA", 51.5270, -0.0300).await;
    mount_postcode(server, "E35BB", 51.5350, -0.0350).await;
}

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

fn postcode() -> Postcode {
    Postcode::parse("e3 2lr").unwrap()
}

fn discovery_options(server: &MockServer) -> DiscoveryOptions {
    DiscoveryOptions {
        search_base_url: format!("{}/service-search/find-a-gp/results", server.uri()),
        max_pages: 5,
        inter_request_delay_ms: 0,
    }
}

fn detail_options(retry_failed: bool) -> DetailOptions {
    DetailOptions {
        inter_request_delay_ms: 0,
        max_concurrent: 2,
        retry_failed,
    }
}

async fn summarise(
    server: &MockServer,
    raw_dir: &Path,
    out: &Path,
    retry_failed: bool,
) -> Result<gpfinder_scraper::EnrichmentReport, PipelineError> {
    summarise_with_timeout(server, raw_dir, out, retry_failed, 5).await
}

/// Runs enrichment with a fresh client, store handle, and geocoder over the
/// raw store at `raw_dir`, and writes the table to `out`.
async fn summarise_with_timeout(
    server: &MockServer,
    raw_dir: &Path,
    out: &Path,
    retry_failed: bool,
    timeout_secs: u64,
) -> Result<gpfinder_scraper::EnrichmentReport, PipelineError> {
    let client = Arc::new(
        DirectoryClient::new(timeout_secs, "gpfinder-test/0.1", 0, 0)
            .expect("failed to build test client"),
    );
    let store: Arc<dyn RawStore> = Arc::new(FsRawStore::new(raw_dir));
    let geocoder = StoreBackedGeocoder::new(
        PostcodesIoGeocoder::new(client.clone(), server.uri()),
        store.clone(),
    );

    let report = run_enrichment(
        client.as_ref(),
        store.as_ref(),
        &geocoder,
        &postcode(),
        &discovery_options(server),
        &detail_options(retry_failed),
    )
    .await?;
    write_summary_csv(out, &report.rows).expect("summary should be written");
    Ok(report)
}

async fn run_discovery(server: &MockServer, raw_dir: &Path) {
    let client = DirectoryClient::new(5, "gpfinder-test/0.1", 0, 0).unwrap();
    discover(
        &client,
        &FsRawStore::new(raw_dir),
        &postcode(),
        &discovery_options(server),
    )
    .await
    .expect("discovery should succeed");
}

fn read_rows(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().iter().map(str::to_owned).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_owned).collect())
        .collect();
    (headers, rows)
}

// ---------------------------------------------------------------------------
// tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn enriches_discovered_surgeries_into_summary_rows() {
    let server = MockServer::start().await;
    mount_directory(&server).await;
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let csv_path = out.path().join("E32LR_surgery_summaries.csv");

    run_discovery(&server, raw.path()).await;
    let report = summarise(&server, raw.path(), &csv_path, false).await.unwrap();
    assert_eq!(report.rows.len(), 3);
    assert_eq!(report.tombstones, 1);
    assert!(raw.path().join("details/C33333.json").exists());

    let (headers, rows) = read_rows(&csv_path);
    assert_eq!(headers, SUMMARY_COLUMNS);
    let ids: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(ids, vec!["A11111", "C33333", "B22222"], "discovery order");

    // Fully enriched: published coordinates equal the origin.
    let a = &rows[0];
    assert_eq!(a[3], "1 Ruston Street, London, E3 2LR");
    assert_eq!(a[4], "020 8980 1000");
    assert_eq!(a[5], "0.00");
    assert_eq!(a[6], "true");
    assert_eq!(a[7], "https://ruston.example.nhs.uk");
    assert_eq!(a[8], r#"["09:00-17:00"]"#);
    assert_eq!(a[9], "[]");
    assert_eq!(a[10], r#"["08:00-12:30","14:00-18:00"]"#);
    assert_eq!(&a[15..], ["3", "4.0", "3", "5"]);

    // Tombstoned: search-listing data only, located by snippet postcode.
    let c = &rows[1];
    assert_eq!(c[1], "Parnell Road Surgery");
    assert_eq!(c[3], "3 Parnell Road, London, E3 5BB");
    assert_eq!(c[4], "");
    assert!(c[5].parse::<f64>().unwrap() > 0.0);
    assert_eq!(c[6], "true");
    assert!(c[8..].iter().all(String::is_empty));

    // Declared catchment wins over the non-catchment listing; no ratings page.
    let b = &rows[2];
    assert_eq!(b[4], "020 8980 2000");
    assert!(b[5].parse::<f64>().unwrap() > 0.0);
    assert_eq!(b[6], "true");
    assert_eq!(b[7], "");
    assert_eq!(b[8], r#"["08:30-18:30"]"#);
    assert!(b[15..].iter().all(String::is_empty));
}

#[tokio::test]
async fn rerun_from_the_raw_store_is_byte_identical() {
    let server = MockServer::start().await;
    mount_directory(&server).await;
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let first = out.path().join("first.csv");
    let second = out.path().join("second.csv");

    run_discovery(&server, raw.path()).await;
    summarise(&server, raw.path(), &first, false).await.unwrap();

    // Every page and postcode is now stored; nothing may reach the network.
    server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    summarise(&server, raw.path(), &second, false).await.unwrap();
    assert_eq!(
        std::fs::read(&first).unwrap(),
        std::fs::read(&second).unwrap()
    );
}

#[tokio::test]
async fn retry_failed_refetches_tombstoned_surgeries() {
    let server = MockServer::start().await;
    mount_directory(&server).await;
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let csv_path = out.path().join("summary.csv");

    run_discovery(&server, raw.path()).await;
    summarise(&server, raw.path(), &csv_path, false).await.unwrap();

    server.reset().await;
    mount_html(
        &server,
        "/services/gp-surgery/s/C33333/contact-details-and-opening-times",
        200,
        CONTACT_C,
    )
    .await;
    mount_html(
        &server,
        "/services/gp-surgery/s/C33333/ratings-and-reviews",
        200,
        &reviews_html(&[]),
    )
    .await;

    let report = summarise(&server, raw.path(), &csv_path, true).await.unwrap();
    assert_eq!(report.tombstones, 0);

    let (_, rows) = read_rows(&csv_path);
    let c = &rows[1];
    assert_eq!(c[0], "C33333");
    assert_eq!(c[4], "020 8980 3000");
    assert_eq!(c[12], r#"["09:00-13:00"]"#);
    assert_eq!(&c[15..], ["0", "0.0", "0", "0"]);
}

#[tokio::test]
async fn slow_contact_page_is_tombstoned_like_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/services/gp-surgery/s/C33333/contact-details-and-opening-times"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(CONTACT_C)
                .set_delay(Duration::from_secs(3)),
        )
        .with_priority(1)
        .mount(&server)
        .await;
    mount_directory(&server).await;
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let csv_path = out.path().join("summary.csv");

    run_discovery(&server, raw.path()).await;
    let report = summarise_with_timeout(&server, raw.path(), &csv_path, false, 1)
        .await
        .unwrap();
    assert_eq!(report.rows.len(), 3);
    assert_eq!(report.tombstones, 1);

    let stored = std::fs::read_to_string(raw.path().join("details/C33333.json")).unwrap();
    let detail: StoredDetail = serde_json::from_str(&stored).unwrap();
    let StoredDetail::Tombstone(tombstone) = detail else {
        panic!("expected tombstone, got {detail:?}");
    };
    assert_eq!(tombstone.id, "C33333");

    let (_, rows) = read_rows(&csv_path);
    let c = &rows[1];
    assert_eq!(c[0], "C33333");
    assert_eq!(c[1], "Parnell Road Surgery");
    assert_eq!(c[4], "");
}

#[tokio::test]
async fn retry_failed_refetches_a_missing_reviews_page() {
    let server = MockServer::start().await;
    mount_directory(&server).await;
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let csv_path = out.path().join("summary.csv");

    run_discovery(&server, raw.path()).await;
    summarise(&server, raw.path(), &csv_path, false).await.unwrap();

    server.reset().await;
    mount_html(
        &server,
        "/services/gp-surgery/s/B22222/ratings-and-reviews",
        200,
        &reviews_html(&[2, 4]),
    )
    .await;

    summarise(&server, raw.path(), &csv_path, true).await.unwrap();
    let (_, rows) = read_rows(&csv_path);
    let b = &rows[2];
    assert_eq!(b[0], "B22222");
    assert_eq!(b[4], "020 8980 2000", "stored contact page is kept");
    assert_eq!(&b[15..], ["2", "3.0", "2", "4"]);
}

#[tokio::test]
async fn summarising_before_discovery_fails() {
    let server = MockServer::start().await;
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    let err = summarise(&server, raw.path(), &out.path().join("x.csv"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NotDiscovered { .. }));
}

#[tokio::test]
async fn unknown_origin_postcode_fails_the_run() {
    let server = MockServer::start().await;
    mount_html(&server, RESULTS_PATH, 200, &results_html()).await;
    Mock::given(method("GET"))
        .and(path("/postcodes/E32LR"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let raw = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    run_discovery(&server, raw.path()).await;
    let err = summarise(&server, raw.path(), &out.path().join("x.csv"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::OriginGeocode { .. }));
}
