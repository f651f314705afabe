// src/crawl/frontier.rs
// =============================================================================
// The crawl frontier: which URLs are waiting, which were already visited.
//
// How it works:
// 1. The start URL is pushed with depth 0
// 2. next() pops the oldest task (breadth-first) and marks it visited
// 3. Links found on that page are pushed with depth + 1
// 4. Once max_pages URLs have been handed out, next() returns None
//
// Rules for accepting a URL:
// - http/https only, fragment stripped (see normalize_link)
// - never queued twice, never visited twice
// - same site as the start URL unless cross-domain crawling is enabled
// - the pending queue is capped at twice the page budget
//
// Rust concepts:
// - HashSet: O(1) "have we seen this URL" lookups
// - VecDeque: FIFO queue for breadth-first traversal
// =============================================================================

use std::collections::{HashSet, VecDeque};
use url::{Host, Url};

/// A URL waiting to be fetched, plus how many link hops it is from the start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: Url,
    pub depth: usize,
}

/// Breadth-first queue with visited-set deduplication and a page budget
#[derive(Debug)]
pub struct Frontier {
    start: Url,
    queue: VecDeque<CrawlTask>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    max_pages: usize,
    same_site_only: bool,
}

impl Frontier {
    pub fn new(start: Url, max_pages: usize, same_site_only: bool) -> Self {
        Self {
            start,
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            max_pages,
            same_site_only,
        }
    }

    /// Queues a URL. Returns false when the URL was rejected.
    pub fn push(&mut self, url: Url, depth: usize) -> bool {
        if !is_crawlable(&url) {
            return false;
        }
        if self.same_site_only && !same_site(&self.start, &url) {
            return false;
        }

        if self.is_visited(&url) || self.queued.contains(url.as_str()) {
            return false;
        }
        if self.queue.len() >= self.max_pages.saturating_mul(2) {
            return false;
        }

        self.queued.insert(url.as_str().to_string());
        self.queue.push_back(CrawlTask { url, depth });
        true
    }

    /// Hands out the next task, or None once the queue is empty or the
    /// page budget is spent
    pub fn next(&mut self) -> Option<CrawlTask> {
        if self.visited.len() >= self.max_pages {
            return None;
        }

        let task = self.queue.pop_front()?;
        self.queued.remove(task.url.as_str());
        self.visited.insert(task.url.as_str().to_string());
        Some(task)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }
}

/// Resolves an href found on `base` into an absolute, fragment-free
/// http(s) URL
///
/// Examples:
///   base = "https://example.com/page"
///   href = "/docs#intro"       -> Some("https://example.com/docs")
///   href = "../other"          -> Some("https://example.com/other")
///   href = "mailto:a@b.com"    -> None
///   href = "#section"          -> None
pub fn normalize_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    // Skip anchors and special protocols
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
        || href.starts_with("data:")
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if !is_crawlable(&url) {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// Two URLs belong to the same site when they share a registrable domain
///
/// `blog.example.com` and `shop.example.com` are one site (`example.com`),
/// `example.co.uk` and `other.co.uk` are not. IP addresses must match
/// exactly. Hosts the public suffix list knows nothing about (`localhost`)
/// fall back to plain host equality, ignoring a leading "www.".
pub fn same_site(a: &Url, b: &Url) -> bool {
    match (site_key(a), site_key(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn site_key(url: &Url) -> Option<String> {
    let domain = match url.host()? {
        Host::Domain(domain) => domain.trim_end_matches('.').to_ascii_lowercase(),
        ip => return Some(ip.to_string()),
    };
    let host = strip_www(&domain);
    Some(psl::domain_str(host).unwrap_or(host).to_string())
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

fn is_crawlable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.host_str().is_some()
}
