// src/checker/html.rs
// =============================================================================
// This module extracts links from HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser), so broken markup is fine
//
// Relative hrefs are resolved against the page URL and cleaned up by
// crawl::normalize_link (fragments dropped, non-http schemes skipped).
// =============================================================================

use scraper::{Html, Selector};
use url::Url;

use crate::crawl::normalize_link;

// Extracts all http(s) links from HTML content
//
// Parameters:
//   html: the HTML content to parse
//   base_url: the URL the page was served from (after redirects)
//
// Example:
//   html = "<a href='/docs'>Docs</a>"
//   base_url = "https://example.com"
//   result = ["https://example.com/docs"]
pub fn extract_html_links(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);

    // Constant selector, known to be valid
    let selector = Selector::parse("a[href]").unwrap();

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| normalize_link(base_url, href))
        .collect()
}
