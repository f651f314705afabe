// src/crawl/mod.rs
// =============================================================================
// This module handles fetching the pages of a website.
//
// Two modes:
// - crawl_site: breadth-first crawl from a start URL, following links on the
//   same site, honoring robots.txt, with a short delay between requests
// - fetch_all: fetch a fixed list of URLs (from a sitemap) with a bounded
//   number of requests in flight, no link following
//
// Either way no URL is fetched twice and at most max_pages pages come back.
// =============================================================================

mod fetch;
mod frontier;
mod robots;
mod sitemap;

pub use fetch::{FetchError, FetchedPage, Fetcher};
pub use frontier::{normalize_link, same_site, Frontier};
pub use robots::RobotsPolicy;
pub use sitemap::load_sitemap;

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::checker::extract_html_links;
use crate::config::AuditConfig;

/// Crawls a website breadth-first starting from `start`
pub async fn crawl_site(
    fetcher: &Fetcher,
    robots: &RobotsPolicy,
    start: &Url,
    config: &AuditConfig,
) -> Vec<FetchedPage> {
    let mut frontier = Frontier::new(start.clone(), config.max_pages, config.same_site_only);
    frontier.push(start.clone(), 0);

    let delay = Duration::from_millis(config.politeness_delay_ms);
    let mut pages = Vec::new();

    while let Some(task) = frontier.next() {
        // Disallowed URLs still count as visited, they are simply not fetched
        if !robots.allows(&task.url) {
            debug!("robots.txt disallows {}", task.url);
            continue;
        }

        info!("Crawling [depth {}]: {}", task.depth, task.url);
        let page = fetcher.fetch(&task.url, task.depth).await;

        if page.is_html() {
            let mut added = 0;
            for link in extract_html_links(&page.body, &page.final_url) {
                if frontier.push(link, task.depth + 1) {
                    added += 1;
                }
            }
            debug!("{} new URL(s) queued from {}", added, task.url);
        } else if page.is_failure() {
            match &page.error {
                Some(error) => warn!("Failed to fetch {}: {}", task.url, error),
                None => warn!("{} answered HTTP {}", task.url, page.status),
            }
        }

        pages.push(page);

        if !delay.is_zero() && frontier.pending_count() > 0 {
            tokio::time::sleep(delay).await;
        }
    }

    info!(
        "Crawl finished: {} page(s) fetched, {} URL(s) visited",
        pages.len(),
        frontier.visited_count()
    );
    pages
}

/// Fetches a list of URLs (sitemap mode)
///
/// Invalid and duplicate URLs are dropped, the list is capped at
/// `max_pages`, and results keep the input order.
pub async fn fetch_all(
    fetcher: &Fetcher,
    robots: &RobotsPolicy,
    urls: &[String],
    config: &AuditConfig,
) -> Vec<FetchedPage> {
    let mut seen = HashSet::new();
    let targets: Vec<Url> = urls
        .iter()
        .filter_map(|raw| match Url::parse(raw.trim()) {
            Ok(mut url) if matches!(url.scheme(), "http" | "https") => {
                url.set_fragment(None);
                Some(url)
            }
            _ => {
                warn!("Skipping invalid sitemap URL: {}", raw);
                None
            }
        })
        .filter(|url| seen.insert(url.as_str().to_string()))
        .take(config.max_pages)
        .filter(|url| {
            let allowed = robots.allows(url);
            if !allowed {
                debug!("robots.txt disallows {}", url);
            }
            allowed
        })
        .collect();

    info!("Fetching {} URL(s) with {} worker(s)", targets.len(), config.workers);

    stream::iter(targets.iter().map(|url| fetcher.fetch(url, 0)))
        .buffered(config.workers)
        .collect()
        .await
}
