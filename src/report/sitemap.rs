// src/report/sitemap.rs
// =============================================================================
// Generates a sitemap.xml (protocol 0.9) from the crawled URLs.
//
// Every entry gets the same <lastmod>, the time of generation in UTC.
// =============================================================================

use chrono::{DateTime, Utc};
use std::collections::HashSet;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Builds the document, keeping the first occurrence of each URL
pub fn build_sitemap<S: AsRef<str>>(urls: &[S], now: DateTime<Utc>) -> String {
    let lastmod = now.format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let mut seen = HashSet::new();

    let mut lines = vec![
        r#"<?xml version="1.0" encoding="UTF-8"?>"#.to_string(),
        format!(r#"<urlset xmlns="{}">"#, SITEMAP_NS),
    ];
    for url in urls {
        let url: &str = url.as_ref();
        if !seen.insert(url) {
            continue;
        }
        lines.push("  <url>".to_string());
        lines.push(format!("    <loc>{}</loc>", html_escape::encode_text(url)));
        lines.push(format!("    <lastmod>{}</lastmod>", lastmod));
        lines.push("  </url>".to_string());
    }
    lines.push("</urlset>".to_string());

    lines.join("\n")
}
