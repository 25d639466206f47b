//! Search results page parsing.

use std::sync::LazyLock;

use gpfinder_core::CandidateRecord;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{collapsed_text, first_text_excluding};
use crate::client::{id_from_url, resolve_href};

static RESULT_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li.results__item").expect("valid selector"));
static ITEM_ID: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"p[id^="item_id_"]"#).expect("valid selector"));
static NAME_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2.results__name a").expect("valid selector"));
static ADDRESS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"p[id^="address_"]"#).expect("valid selector"));
static DISTANCE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"p[id^="distance_"]"#).expect("valid selector"));
static NEXT_PAGE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        r#".nhsuk-pagination__link--next, .nhsuk-pagination-item--next a, a[rel="next"]"#,
    )
    .expect("valid selector")
});

static MILES_AWAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]+(?:\.[0-9]+)?)\s*miles?\s+away").expect("valid distance regex")
});

const CATCHMENT_LIST_ID: &str = "catchment_gps_list";
const NON_CATCHMENT_LIST_ID: &str = "non_catchment_gps_list";

/// One parsed results page.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    /// Candidates in document order. May contain identifiers already seen
    /// on earlier pages; deduplication happens across pages.
    pub candidates: Vec<CandidateRecord>,
    /// Whether the page links to a following page.
    pub has_next: bool,
}

/// Parses results page `page`, resolving relative links against `page_url`.
#[must_use]
pub fn parse_search_page(html: &str, page_url: &str, page: u32) -> SearchPage {
    let document = Html::parse_document(html);
    let candidates = document
        .select(&RESULT_ITEM)
        .filter_map(|item| parse_result_item(item, page_url, page))
        .collect();
    let has_next = document.select(&NEXT_PAGE).next().is_some();
    SearchPage {
        candidates,
        has_next,
    }
}

fn parse_result_item(item: ElementRef<'_>, page_url: &str, page: u32) -> Option<CandidateRecord> {
    let link = item.select(&NAME_LINK).next();
    let name = link.and_then(|a| first_text_excluding(a, "navigates to more detail for"));
    let href = link
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|h| !h.is_empty());

    let (Some(name), Some(href)) = (name, href) else {
        tracing::debug!(page, "skipping result without a name or link");
        return None;
    };
    let nhs_url = resolve_href(page_url, href);

    let id = item
        .select(&ITEM_ID)
        .next()
        .map(collapsed_text)
        .filter(|id| !id.is_empty())
        .or_else(|| id_from_url(&nhs_url));
    let Some(id) = id else {
        tracing::warn!(page, name = %name, url = %nhs_url, "result has no identifier; skipping");
        return None;
    };

    let address_snippet = item
        .select(&ADDRESS)
        .next()
        .and_then(|p| first_text_excluding(p, "Address for this organisation is"));

    let listed_distance_miles = item
        .select(&DISTANCE)
        .next()
        .and_then(|p| first_text_excluding(p, "This organisation is"))
        .and_then(|text| {
            MILES_AWAY
                .captures(&text)
                .and_then(|caps| caps[1].parse::<f64>().ok())
        });

    Some(CandidateRecord {
        id,
        name,
        nhs_url,
        address_snippet,
        listed_distance_miles,
        listed_in_catchment: catchment_list_flag(item),
        page,
    })
}

/// Which results list the item sits in, if either.
fn catchment_list_flag(item: ElementRef<'_>) -> Option<bool> {
    item.ancestors()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "ol")
        .find_map(|ol| match ol.value().id() {
            Some(CATCHMENT_LIST_ID) => Some(true),
            Some(NON_CATCHMENT_LIST_ID) => Some(false),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://www.nhs.uk/service-search/find-a-gp/results/E32LR";

    fn result_item(id: &str, name: &str, distance: &str) -> String {
        format!(
            r#"<li class="results__item">
                <p class="nhsuk-u-visually-hidden" id="item_id_{id}">{id}</p>
                <h2 class="results__name">
                  <a class="nhsapp-open-in-webview" href="/services/gp-surgery/{slug}/{id}">
                    <span class="nhsuk-u-visually-hidden">navigates to more detail for</span>{name}
                  </a>
                </h2>
                <p id="address_{id}"><span class="nhsuk-u-visually-hidden">Address for this organisation is</span>1 Ruston Street, London, E3 2LR</p>
                <p id="phone_{id}"><span class="nhsuk-u-visually-hidden">Phone number for this organisation is</span>020 8980 1000</p>
                <p id="distance_{id}"><span class="nhsuk-u-visually-hidden">This organisation is</span>{distance}</p>
              </li>"#,
            slug = name.to_lowercase().replace(' ', "-"),
        )
    }

    #[test]
    fn parses_both_catchment_lists_in_document_order() {
        let html = format!(
            r#"<html><body>
                <ol id="catchment_gps_list">{}</ol>
                <ol id="non_catchment_gps_list">{}</ol>
              </body></html>"#,
            result_item("F84030", "Ruston Street Clinic", "0.4 miles away"),
            result_item("F84047", "Bow Health Centre", "1.2 miles away"),
        );

        let page = parse_search_page(&html, PAGE_URL, 1);
        assert!(!page.has_next);
        assert_eq!(page.candidates.len(), 2);

        let first = &page.candidates[0];
        assert_eq!(first.id, "F84030");
        assert_eq!(first.name, "Ruston Street Clinic");
        assert_eq!(
            first.nhs_url,
            "https://www.nhs.uk/services/gp-surgery/ruston-street-clinic/F84030"
        );
        assert_eq!(
            first.address_snippet.as_deref(),
            Some("1 Ruston Street, London, E3 2LR")
        );
        assert_eq!(first.listed_distance_miles, Some(0.4));
        assert_eq!(first.listed_in_catchment, Some(true));
        assert_eq!(first.page, 1);

        assert_eq!(page.candidates[1].id, "F84047");
        assert_eq!(page.candidates[1].listed_in_catchment, Some(false));
    }

    #[test]
    fn results_outside_known_lists_have_no_catchment_flag() {
        let html = format!(
            r#"<ol class="results">{}</ol>"#,
            result_item("F84030", "Ruston Street Clinic", "0.4 miles away")
        );
        let page = parse_search_page(&html, PAGE_URL, 2);
        assert_eq!(page.candidates[0].listed_in_catchment, None);
        assert_eq!(page.candidates[0].page, 2);
    }

    #[test]
    fn missing_item_id_falls_back_to_url_segment() {
        let html = r#"<ol id="catchment_gps_list"><li class="results__item">
            <h2 class="results__name"><a href="https://www.nhs.uk/services/gp-surgery/x/Y12345">X Surgery</a></h2>
          </li></ol>"#;
        let page = parse_search_page(html, PAGE_URL, 1);
        assert_eq!(page.candidates[0].id, "Y12345");
        assert_eq!(page.candidates[0].address_snippet, None);
        assert_eq!(page.candidates[0].listed_distance_miles, None);
    }

    #[test]
    fn items_without_name_or_link_are_skipped() {
        let html = r#"<ol id="catchment_gps_list">
            <li class="results__item"><h2 class="results__name">No link here</h2></li>
            <li class="results__item"><h2 class="results__name"><a href="/services/gp-surgery/x/A1"></a></h2></li>
          </ol>"#;
        let page = parse_search_page(html, PAGE_URL, 1);
        assert!(page.candidates.is_empty());
    }

    #[test]
    fn next_link_is_detected() {
        let html = format!(
            r#"<ol id="catchment_gps_list">{}</ol>
               <nav class="nhsuk-pagination"><ul>
                 <li class="nhsuk-pagination-item--next"><a class="nhsuk-pagination__link nhsuk-pagination__link--next" href="?page=2">Next</a></li>
               </ul></nav>"#,
            result_item("F84030", "Ruston Street Clinic", "0.4 miles away")
        );
        assert!(parse_search_page(&html, PAGE_URL, 1).has_next);
    }

    #[test]
    fn distance_without_miles_is_ignored() {
        let html = format!(
            r#"<ol id="catchment_gps_list">{}</ol>"#,
            result_item("F84030", "Ruston Street Clinic", "nearby")
        );
        let page = parse_search_page(&html, PAGE_URL, 1);
        assert_eq!(page.candidates[0].listed_distance_miles, None);
    }
}
