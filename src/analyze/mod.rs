// src/analyze/mod.rs
// =============================================================================
// Turns a fetched page into the on-page SEO signals the report is built from.
//
// Extracted per page:
// - title (text, length, estimated pixel width), meta description, robots
// - canonical link and whether it points back at the page
// - heading counts h1..h6 and the h1 texts
// - images and how many lack alt text
// - internal / external / nofollow link counts and the outbound links
// - Open Graph, Twitter Card, hreflang and JSON-LD structured data
// - visible word count, top terms and optional keyword density
//
// The parser is lenient: broken markup still produces a result. Pages that
// failed or are not HTML get a result with empty signals.
// =============================================================================

mod jsonld;
mod text;

pub use jsonld::extract_jsonld_types;
pub use text::{keyword_density, top_terms, visible_text};

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::HashSet;
use url::Url;

use crate::config::Thresholds;
use crate::crawl::{normalize_link, same_site, FetchedPage};

/// How many h1 texts are kept per page
const MAX_H1_TEXTS: usize = 5;

/// Terms kept in PageResult::top_terms
const TOP_TERMS: usize = 10;

/// Inputs to the analyzer besides the page itself
#[derive(Debug, Clone, Default)]
pub struct AnalyzerConfig {
    pub thresholds: Thresholds,
    /// Keyword whose density is measured on every page
    pub keyword: Option<String>,
}

/// Everything extracted from one page
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageResult {
    pub url: String,
    pub depth: usize,
    pub status: u16,
    pub content_type: String,
    pub resp_ms: u64,
    pub redirects: Vec<String>,
    pub bytes_kb: f64,
    pub title: String,
    pub title_len: usize,
    pub title_px: usize,
    pub title_ok: bool,
    pub meta_desc: String,
    pub meta_desc_len: usize,
    pub meta_desc_ok: bool,
    pub meta_robots: String,
    pub canonical: String,
    pub self_canonical: bool,
    pub h1_count: usize,
    pub h1_texts: Vec<String>,
    pub h2_count: usize,
    pub h3_count: usize,
    pub h4_count: usize,
    pub h5_count: usize,
    pub h6_count: usize,
    pub img_total: usize,
    pub img_missing_alt: usize,
    pub links_internal: usize,
    pub links_external: usize,
    pub links_nofollow: usize,
    pub open_graph: bool,
    pub twitter_card: bool,
    pub hreflang_count: usize,
    pub jsonld_types: Vec<String>,
    pub word_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_density: Option<f64>,
    pub top_terms: Vec<(String, usize)>,
    /// Unique absolute links found on the page, in document order
    #[serde(skip)]
    pub outbound_links: Vec<String>,
    /// Transport error when status is 0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageResult {
    /// A 200 HTML page, the only kind the content checks apply to
    pub fn is_html_ok(&self) -> bool {
        self.status == 200 && self.content_type.to_ascii_lowercase().starts_with("text/html")
    }

    /// A result carrying only the fetch metadata
    fn from_fetch(page: &FetchedPage) -> Self {
        Self {
            url: page.url.to_string(),
            depth: page.depth,
            status: page.status,
            content_type: page.content_type.clone().unwrap_or_default(),
            resp_ms: page.elapsed_ms,
            redirects: page.redirects.clone(),
            bytes_kb: (page.body.len() as f64 / 1024.0 * 10.0).round() / 10.0,
            error: page.error.as_ref().map(|e| e.to_string()),
            ..Self::default()
        }
    }
}

/// Analyzes one fetched page
pub fn analyze_page(page: &FetchedPage, config: &AnalyzerConfig) -> PageResult {
    let mut result = PageResult::from_fetch(page);
    if !page.has_html_body() || page.body.is_empty() {
        return result;
    }

    let document = Html::parse_document(&page.body);
    let thresholds = &config.thresholds;

    // Title
    result.title = first_text(&document, "title");
    result.title_len = result.title.chars().count();
    result.title_px = estimate_title_pixels(&result.title);
    result.title_ok = (thresholds.title_min..=thresholds.title_max).contains(&result.title_len)
        && result.title_px <= thresholds.title_max_px;

    // Meta tags
    result.meta_desc = meta_content(&document, "description");
    result.meta_desc_len = result.meta_desc.chars().count();
    result.meta_desc_ok = (thresholds.desc_min..=thresholds.desc_max).contains(&result.meta_desc_len);
    result.meta_robots = meta_content(&document, "robots");

    // Canonical
    result.canonical = select_all(&document, "link[rel][href]")
        .find(|link| has_rel(link, "canonical"))
        .and_then(|link| link.value().attr("href"))
        .map(|href| href.trim().to_string())
        .unwrap_or_default();
    result.self_canonical = !result.canonical.is_empty()
        && same_url_loosely(&result.canonical, &result.url);

    // Headings
    let h1s: Vec<String> = select_all(&document, "h1").map(|h| collapsed_text(&h)).collect();
    result.h1_count = h1s.len();
    result.h1_texts = h1s.into_iter().take(MAX_H1_TEXTS).collect();
    result.h2_count = select_all(&document, "h2").count();
    result.h3_count = select_all(&document, "h3").count();
    result.h4_count = select_all(&document, "h4").count();
    result.h5_count = select_all(&document, "h5").count();
    result.h6_count = select_all(&document, "h6").count();

    // Images
    for img in select_all(&document, "img") {
        result.img_total += 1;
        let alt = img.value().attr("alt").map(str::trim).unwrap_or("");
        if alt.is_empty() {
            result.img_missing_alt += 1;
        }
    }

    // Links, resolved against the URL that actually answered
    let mut seen = HashSet::new();
    for anchor in select_all(&document, "a[href]") {
        let Some(link) = anchor
            .value()
            .attr("href")
            .and_then(|href| normalize_link(&page.final_url, href))
        else {
            continue;
        };

        if same_site(&page.final_url, &link) {
            result.links_internal += 1;
        } else {
            result.links_external += 1;
        }
        if has_rel(&anchor, "nofollow") {
            result.links_nofollow += 1;
        }
        if seen.insert(link.as_str().to_string()) {
            result.outbound_links.push(link.into());
        }
    }

    // Social and structured data
    result.open_graph = select_all(&document, "meta[property]").any(|m| {
        attr_starts_with(&m, "property", "og:")
    });
    result.twitter_card = select_all(&document, "meta").any(|m| {
        attr_starts_with(&m, "name", "twitter:") || attr_starts_with(&m, "property", "twitter:")
    });
    result.hreflang_count = select_all(&document, "link[hreflang]")
        .filter(|link| has_rel(link, "alternate"))
        .count();
    result.jsonld_types = extract_jsonld_types(&document);

    // Content
    let text = visible_text(&document);
    result.word_count = text.split_whitespace().count();
    result.top_terms = top_terms(&text, TOP_TERMS);
    result.keyword_density = config
        .keyword
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .map(|k| keyword_density(&text, k));

    result
}

/// Rough pixel width of a title as rendered in search results
///
/// Uppercase letters count 8px, narrow `i`/`l` 4px, wide `MW@#%&` 10px and
/// everything else 7px.
pub fn estimate_title_pixels(title: &str) -> usize {
    title
        .chars()
        .map(|ch| {
            if "MW@#%&".contains(ch) {
                10
            } else if ch.is_uppercase() {
                8
            } else if ch == 'i' || ch == 'l' {
                4
            } else {
                7
            }
        })
        .sum()
}

// Selectors in this module are constants, so parsing cannot fail
fn select_all<'a>(document: &'a Html, css: &str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    let selector = Selector::parse(css).unwrap();
    document.select(&selector).collect::<Vec<_>>().into_iter()
}

fn first_text(document: &Html, css: &str) -> String {
    select_all(document, css)
        .next()
        .map(|element| collapsed_text(&element))
        .unwrap_or_default()
}

fn collapsed_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Content of the first <meta name=...> matching `name`, case-insensitively
fn meta_content(document: &Html, name: &str) -> String {
    select_all(document, "meta[name]")
        .find(|m| {
            m.value()
                .attr("name")
                .map(|n| n.trim().eq_ignore_ascii_case(name))
                .unwrap_or(false)
        })
        .and_then(|m| m.value().attr("content"))
        .map(|c| c.trim().to_string())
        .unwrap_or_default()
}

fn has_rel(element: &ElementRef<'_>, token: &str) -> bool {
    element
        .value()
        .attr("rel")
        .map(|rel| rel.split_whitespace().any(|t| t.eq_ignore_ascii_case(token)))
        .unwrap_or(false)
}

fn attr_starts_with(element: &ElementRef<'_>, attr: &str, prefix: &str) -> bool {
    element
        .value()
        .attr(attr)
        .map(|value| value.trim().to_ascii_lowercase().starts_with(prefix))
        .unwrap_or(false)
}

/// Equal ignoring case and a trailing slash, after resolving `href`
/// against `page`
fn same_url_loosely(href: &str, page: &str) -> bool {
    let resolved = Url::parse(page)
        .ok()
        .and_then(|base| base.join(href).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| href.to_string());

    let clean = |s: &str| s.trim_end_matches('/').to_lowercase();
    clean(&resolved) == clean(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head>
  <title>  Rust SEO   Toolbox </title>
  <meta name="Description" content=" Audit your site. ">
  <meta name="robots" content="noindex, follow">
  <link rel="canonical" href="/guide/">
  <link rel="alternate" hreflang="tr" href="/tr/guide/">
  <link rel="alternate" hreflang="en" href="/guide/">
  <meta property="og:title" content="Guide">
  <meta name="twitter:card" content="summary">
  <script type="application/ld+json">{"@type": "Article"}</script>
</head><body>
  <h1>Rust   guide</h1><h1>Second</h1><h2>a</h2><h2>b</h2><h3>c</h3>
  <img src="a.png" alt="diagram"><img src="b.png"><img src="c.png" alt="  ">
  <a href="/other">internal</a>
  <a href="https://www.example.com/x#y">internal www</a>
  <a href="https://elsewhere.org/" rel="nofollow noopener">external</a>
  <a href="/other">duplicate</a>
  <a href="mailto:me@example.com">mail</a>
  <p>rust rust crawler</p>
</body></html>"#;

    fn fetched(body: &str, status: u16, content_type: Option<&str>) -> FetchedPage {
        let url = Url::parse("https://example.com/guide").unwrap();
        FetchedPage {
            url: url.clone(),
            final_url: url,
            depth: 1,
            status,
            content_type: content_type.map(str::to_string),
            redirects: vec![],
            elapsed_ms: 120,
            body: body.to_string(),
            error: None,
        }
    }

    fn analyze(body: &str) -> PageResult {
        let config = AnalyzerConfig {
            keyword: Some("rust".into()),
            ..AnalyzerConfig::default()
        };
        analyze_page(&fetched(body, 200, Some("text/html; charset=utf-8")), &config)
    }

    #[test]
    fn test_head_signals() {
        let result = analyze(PAGE);
        assert_eq!(result.title, "Rust SEO Toolbox");
        assert_eq!(result.title_len, 16);
        assert!(!result.title_ok);
        assert_eq!(result.meta_desc, "Audit your site.");
        assert!(!result.meta_desc_ok);
        assert_eq!(result.meta_robots, "noindex, follow");
        assert_eq!(result.canonical, "/guide/");
        assert!(result.self_canonical);
        assert!(result.open_graph);
        assert!(result.twitter_card);
        assert_eq!(result.hreflang_count, 2);
        assert_eq!(result.jsonld_types, vec!["Article"]);
    }

    #[test]
    fn test_body_signals() {
        let result = analyze(PAGE);
        assert_eq!(result.h1_count, 2);
        assert_eq!(result.h1_texts, vec!["Rust guide", "Second"]);
        assert_eq!(result.h2_count, 2);
        assert_eq!(result.h3_count, 1);
        assert_eq!(result.h4_count, 0);
        assert_eq!(result.img_total, 3);
        assert_eq!(result.img_missing_alt, 2);
        assert_eq!(result.links_internal, 3);
        assert_eq!(result.links_external, 1);
        assert_eq!(result.links_nofollow, 1);
        assert_eq!(
            result.outbound_links,
            vec![
                "https://example.com/other",
                "https://www.example.com/x",
                "https://elsewhere.org/",
            ]
        );
    }

    #[test]
    fn test_subdomains_count_as_internal() {
        let result = analyze(
            r#"<a href="https://blog.example.com/post">blog</a>
               <a href="https://shop.example.com/">shop</a>
               <a href="https://example.co.uk/">other registrable domain</a>"#,
        );
        assert_eq!(result.links_internal, 2);
        assert_eq!(result.links_external, 1);
    }

    #[test]
    fn test_content_signals() {
        let result = analyze(PAGE);
        assert!(result.word_count > 10);
        assert!(result.keyword_density.unwrap() > 0.0);
        assert_eq!(result.top_terms[0].0, "rust");
    }

    #[test]
    fn test_non_html_has_empty_signals() {
        let page = fetched("{\"a\": 1}", 200, Some("application/json"));
        let result = analyze_page(&page, &AnalyzerConfig::default());
        assert_eq!(result.status, 200);
        assert!(result.title.is_empty());
        assert_eq!(result.word_count, 0);
        assert!(result.keyword_density.is_none());
    }

    #[test]
    fn test_failed_fetch_keeps_error() {
        let mut page = fetched("", 0, None);
        page.error = Some(crate::crawl::FetchError::Timeout);
        let result = analyze_page(&page, &AnalyzerConfig::default());
        assert_eq!(result.status, 0);
        assert_eq!(result.error.as_deref(), Some("request timed out"));
    }

    #[test]
    fn test_title_ok_range() {
        let title = "Practical Rust crawling for on-page SEO audits today";
        assert_eq!(title.chars().count(), 52);
        let result = analyze(&format!("<title>{}</title>", title));
        assert!(result.title_ok);
    }

    #[test]
    fn test_title_pixels() {
        assert_eq!(estimate_title_pixels(""), 0);
        assert_eq!(estimate_title_pixels("Ail"), 8 + 4 + 4);
        assert_eq!(estimate_title_pixels("M@x"), 10 + 10 + 7);
    }

    #[test]
    fn test_bytes_kb_rounded() {
        let body = "a".repeat(1536);
        let result = analyze_page(&fetched(&body, 200, Some("text/plain")), &AnalyzerConfig::default());
        assert_eq!(result.bytes_kb, 1.5);
    }
}
