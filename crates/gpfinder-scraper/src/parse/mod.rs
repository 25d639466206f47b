//! Markup parsers for search result pages and surgery detail pages.
//!
//! Every parser is a pure function over already-fetched HTML. Search pages
//! produce candidate records; detail pages are split into one parser per
//! field so each can fail on its own without taking the row down.

pub mod address;
pub mod detail;
pub mod hours;
pub mod reviews;
pub mod search;

use scraper::ElementRef;

/// All descendant text of `element`, whitespace-collapsed.
pub(crate) fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Non-empty trimmed text nodes of `element`, in document order.
pub(crate) fn text_nodes(element: ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .collect()
}

/// The first text node of `element` that is not screen-reader prefix text.
///
/// The directory prefixes visible values with visually hidden sentences
/// such as "Address for this organisation is"; `hidden_prefix` names the
/// start of that sentence.
pub(crate) fn first_text_excluding(element: ElementRef<'_>, hidden_prefix: &str) -> Option<String> {
    text_nodes(element)
        .into_iter()
        .find(|t| !t.starts_with(hidden_prefix))
}
