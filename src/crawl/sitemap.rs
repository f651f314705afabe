// src/crawl/sitemap.rs
// =============================================================================
// Reads sitemap.xml files.
//
// Both flavours are understood:
// - <urlset>       : page URLs in <url><loc>...</loc></url>
// - <sitemapindex> : child sitemaps in <sitemap><loc>...</loc></sitemap>
//
// Child sitemaps are followed one level deep. The document is read with a
// streaming XML reader so <loc> values wrapped in CDATA are kept as well.
// A malformed document keeps whatever entries came before the error.
// =============================================================================

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

use super::fetch::Fetcher;

/// Most child sitemaps read from one sitemap index
const MAX_NESTED_SITEMAPS: usize = 8;

/// The <loc> entries of one sitemap document
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SitemapDoc {
    /// Page URLs, deduplicated, in document order
    pub urls: Vec<String>,
    /// Child sitemaps listed by a sitemap index
    pub nested: Vec<String>,
}

/// Which element a <loc> belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LocParent {
    Url,
    Sitemap,
}

pub fn parse_sitemap(xml: &str) -> SitemapDoc {
    let mut reader = Reader::from_str(xml);
    let mut doc = SitemapDoc::default();
    let mut seen = HashSet::new();

    let mut parent: Option<LocParent> = None;
    let mut in_loc = false;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"url" => parent = Some(LocParent::Url),
                b"sitemap" => parent = Some(LocParent::Sitemap),
                b"loc" if parent.is_some() => {
                    in_loc = true;
                    text.clear();
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_loc => match e.unescape() {
                Ok(chunk) => text.push_str(&chunk),
                Err(err) => debug!("Bad escape in sitemap <loc>: {}", err),
            },
            Ok(Event::CData(e)) if in_loc => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"loc" if in_loc => {
                    in_loc = false;
                    let loc = text.trim();
                    if !loc.is_empty() && seen.insert((parent, loc.to_string())) {
                        match parent {
                            Some(LocParent::Url) => doc.urls.push(loc.to_string()),
                            Some(LocParent::Sitemap) => doc.nested.push(loc.to_string()),
                            None => {}
                        }
                    }
                }
                b"url" | b"sitemap" => parent = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(
                    "Malformed sitemap XML at byte {}: {}",
                    reader.buffer_position(),
                    e
                );
                break;
            }
            _ => {}
        }
    }

    doc
}

/// Fetches a sitemap and returns the page URLs it lists
///
/// Failures are logged and produce an empty list.
pub async fn load_sitemap(fetcher: &Fetcher, sitemap_url: &Url) -> Vec<String> {
    let Some(doc) = fetch_sitemap(fetcher, sitemap_url).await else {
        return Vec::new();
    };

    let mut seen: HashSet<String> = doc.urls.iter().cloned().collect();
    let mut urls = doc.urls;

    for child in doc.nested.iter().take(MAX_NESTED_SITEMAPS) {
        let Ok(child_url) = Url::parse(child) else {
            warn!("Skipping malformed nested sitemap URL: {}", child);
            continue;
        };
        if let Some(child_doc) = fetch_sitemap(fetcher, &child_url).await {
            urls.extend(child_doc.urls.into_iter().filter(|u| seen.insert(u.clone())));
        }
    }

    info!("Sitemap {} lists {} URL(s)", sitemap_url, urls.len());
    urls
}

async fn fetch_sitemap(fetcher: &Fetcher, url: &Url) -> Option<SitemapDoc> {
    let page = fetcher.fetch(url, 0).await;
    if !page.is_success() {
        match &page.error {
            Some(error) => warn!("Could not read sitemap {}: {}", url, error),
            None => warn!("Could not read sitemap {}: HTTP {}", url, page.status),
        }
        return None;
    }
    Some(parse_sitemap(&page.body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuditConfig;
    use wiremock::matchers::path;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const URLSET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc><lastmod>2024-01-01</lastmod></url>
  <url><loc> https://example.com/about </loc></url>
  <url><loc>https://example.com/</loc></url>
  <url><loc>https://example.com/search?q=a&amp;page=2</loc></url>
</urlset>"#;

    #[test]
    fn test_parse_urlset() {
        let doc = parse_sitemap(URLSET);
        assert_eq!(
            doc.urls,
            vec![
                "https://example.com/",
                "https://example.com/about",
                "https://example.com/search?q=a&page=2",
            ]
        );
        assert!(doc.nested.is_empty());
    }

    #[test]
    fn test_parse_sitemap_index() {
        let xml = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
            <sitemap><loc>https://example.com/posts.xml</loc></sitemap>
            <sitemap><loc>https://example.com/pages.xml</loc></sitemap>
        </sitemapindex>"#;
        let doc = parse_sitemap(xml);
        assert!(doc.urls.is_empty());
        assert_eq!(doc.nested.len(), 2);
    }

    #[test]
    fn test_parse_cdata_loc() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc><![CDATA[https://example.com/a?x=1&y=2]]></loc></url>
  <url><loc>https://example.com/b</loc></url>
</urlset>"#;
        let doc = parse_sitemap(xml);
        assert_eq!(
            doc.urls,
            vec!["https://example.com/a?x=1&y=2", "https://example.com/b"]
        );
    }

    #[test]
    fn test_parse_keeps_entries_before_error() {
        let xml = "<urlset><url><loc>https://example.com/ok</loc></url><url></broken></urlset>";
        assert_eq!(parse_sitemap(xml).urls, vec!["https://example.com/ok"]);
    }

    #[test]
    fn test_parse_garbage_is_empty() {
        assert_eq!(parse_sitemap("not xml at all"), SitemapDoc::default());
    }

    #[tokio::test]
    async fn test_load_follows_index() {
        let server = MockServer::start().await;
        let index = format!(
            "<sitemapindex><sitemap><loc>{0}/a.xml</loc></sitemap>\
             <sitemap><loc>{0}/b.xml</loc></sitemap></sitemapindex>",
            server.uri()
        );
        Mock::given(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(index))
            .mount(&server)
            .await;
        Mock::given(path("/a.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<urlset><url><loc>https://example.com/1</loc></url></urlset>",
            ))
            .mount(&server)
            .await;
        Mock::given(path("/b.xml"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&AuditConfig::default()).unwrap();
        let url = Url::parse(&format!("{}/sitemap.xml", server.uri())).unwrap();
        let urls = load_sitemap(&fetcher, &url).await;
        assert_eq!(urls, vec!["https://example.com/1"]);
    }

    #[tokio::test]
    async fn test_load_missing_sitemap() {
        let server = MockServer::start().await;
        let fetcher = Fetcher::new(&AuditConfig::default()).unwrap();
        let url = Url::parse(&format!("{}/sitemap.xml", server.uri())).unwrap();
        assert!(load_sitemap(&fetcher, &url).await.is_empty());
    }
}
