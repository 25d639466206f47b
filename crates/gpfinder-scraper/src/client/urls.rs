//! URL construction for search result pages and surgery detail pages.

use gpfinder_core::Postcode;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Url;

use crate::error::ScraperError;

/// Builds the URL of results page `page` (1-based) for `postcode`.
///
/// Page 1 carries no query string; later pages add `?page=N`.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidUrl`] if `base_url` is not a valid URL.
pub fn search_page_url(base_url: &str, postcode: &Postcode, page: u32) -> Result<String, ScraperError> {
    let encoded = utf8_percent_encode(postcode.as_str(), NON_ALPHANUMERIC);
    let raw = format!("{}/{encoded}", base_url.trim_end_matches('/'));
    let mut url = Url::parse(&raw).map_err(|e| ScraperError::InvalidUrl {
        url: raw.clone(),
        reason: e.to_string(),
    })?;
    if page > 1 {
        url.query_pairs_mut().append_pair("page", &page.to_string());
    }
    Ok(url.to_string())
}

/// The contact details and opening times page for a surgery.
#[must_use]
pub fn contact_url(nhs_url: &str) -> String {
    format!(
        "{}/contact-details-and-opening-times",
        nhs_url.trim_end_matches('/')
    )
}

/// The ratings and reviews page for a surgery.
#[must_use]
pub fn reviews_url(nhs_url: &str) -> String {
    format!("{}/ratings-and-reviews", nhs_url.trim_end_matches('/'))
}

/// Resolves a possibly-relative `href` against the page it appeared on.
///
/// Falls back to the raw `href` when either side does not parse.
#[must_use]
pub fn resolve_href(page_url: &str, href: &str) -> String {
    Url::parse(page_url)
        .and_then(|base| base.join(href))
        .map_or_else(|_| href.to_owned(), |u| u.to_string())
}

/// The trailing path segment of a detail URL, which carries the
/// organisation code (e.g. `F84030`).
#[must_use]
pub fn id_from_url(url: &str) -> Option<String> {
    let path = Url::parse(url).map_or_else(|_| url.to_owned(), |u| u.path().to_owned());
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postcode() -> Postcode {
        Postcode::parse("SW1A 1AA").unwrap()
    }

    #[test]
    fn search_page_url_first_page_has_no_query() {
        let url = search_page_url(
            "https://www.nhs.uk/service-search/find-a-gp/results/",
            &postcode(),
            1,
        )
        .unwrap();
        assert_eq!(url, "https://www.nhs.uk/service-search/find-a-gp/results/SW1A1AA");
    }

    #[test]
    fn search_page_url_later_pages_add_page_param() {
        let url = search_page_url(
            "https://www.nhs.uk/service-search/find-a-gp/results",
            &postcode(),
            3,
        )
        .unwrap();
        assert_eq!(
            url,
            "https://www.nhs.uk/service-search/find-a-gp/results/SW1A1AA?page=3"
        );
    }

    #[test]
    fn search_page_url_rejects_invalid_base() {
        let result = search_page_url("not a url", &postcode(), 1);
        assert!(matches!(result, Err(ScraperError::InvalidUrl { .. })));
    }

    #[test]
    fn detail_urls_append_page_names() {
        let base = "https://www.nhs.uk/services/gp-surgery/ruston-street-clinic/F84030/";
        assert_eq!(
            contact_url(base),
            "https://www.nhs.uk/services/gp-surgery/ruston-street-clinic/F84030/contact-details-and-opening-times"
        );
        assert_eq!(
            reviews_url(base),
            "https://www.nhs.uk/services/gp-surgery/ruston-street-clinic/F84030/ratings-and-reviews"
        );
    }

    #[test]
    fn resolve_href_handles_relative_paths() {
        assert_eq!(
            resolve_href(
                "https://www.nhs.uk/service-search/find-a-gp/results/SW1A1AA",
                "/services/gp-surgery/x/A1"
            ),
            "https://www.nhs.uk/services/gp-surgery/x/A1"
        );
    }

    #[test]
    fn id_from_url_takes_last_segment() {
        assert_eq!(
            id_from_url("https://www.nhs.uk/services/gp-surgery/ruston-street-clinic/F84030"),
            Some("F84030".to_owned())
        );
        assert_eq!(id_from_url("https://www.nhs.uk/"), None);
    }
}
