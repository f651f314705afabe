// src/checker/http.rs
// =============================================================================
// This module checks if URLs are alive by making HTTP requests.
//
// Key functionality:
// - Makes HTTP HEAD requests (lightweight, no body download)
// - Falls back to GET when a server refuses HEAD (405 / 501)
// - Detects various failure modes (404, timeout, SSL errors, etc.)
// - Runs checks concurrently with a bounded number of requests in flight
//
// Each unique URL is probed once, even when many pages link to it. The
// result remembers every page that contained the link so the report can
// point at them.
// =============================================================================

use anyhow::Result;
use futures::stream::{self, StreamExt}; // StreamExt gives us .buffer_unordered()
use reqwest::header::LOCATION;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::AuditConfig;
use crate::crawl::FetchError;

// Represents the status of a link after checking
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "target", rename_all = "snake_case")]
pub enum LinkStatus {
    /// Link is working (2xx)
    Ok,
    /// Link redirects to another URL (301, 302, etc.)
    Redirect(String),
    /// Link is broken (404, 410)
    Broken,
    /// Request timed out
    Timeout,
    /// SSL/TLS certificate error
    SslError,
    /// Too many redirects (redirect loop)
    TooManyRedirects,
    /// Could not resolve hostname
    DnsError,
    /// Other error (5xx, connection reset, ...)
    Error,
}

// The result of checking a single link
#[derive(Debug, Clone, Serialize)]
pub struct LinkCheckResult {
    /// The URL that was checked
    pub url: String,
    /// Pages the link was found on
    pub sources: Vec<String>,
    #[serde(flatten)]
    pub status: LinkStatus,
    /// HTTP status code, when a response arrived
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LinkCheckResult {
    /// Returns true for Ok and Redirect statuses
    pub fn is_ok(&self) -> bool {
        matches!(self.status, LinkStatus::Ok | LinkStatus::Redirect(_))
    }
}

/// HTTP client tuned for probing links
#[derive(Debug, Clone)]
pub struct LinkChecker {
    client: Client,
    concurrency: usize,
}

impl LinkChecker {
    pub fn new(config: &AuditConfig) -> Result<Self> {
        // Redirects are not followed: a 301 is reported as a redirect,
        // which is what an SEO audit wants to see
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            concurrency: config.link_workers,
        })
    }
}

// Checks links concurrently
//
// `links` holds (source page, link URL) pairs. Duplicate URLs are checked
// once. Results come back sorted by URL.
pub async fn check_links(checker: &LinkChecker, links: Vec<(String, String)>) -> Vec<LinkCheckResult> {
    // BTreeMap keeps the output order stable
    let mut by_url: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (source, url) in links {
        let sources = by_url.entry(url).or_default();
        if !sources.contains(&source) {
            sources.push(source);
        }
    }

    info!("Checking {} unique link(s)", by_url.len());

    let futures = by_url.into_iter().map(|(url, sources)| {
        let client = checker.client.clone(); // cheap, Client is an Arc inside
        async move {
            let mut result = check_single_link(client, url).await;
            result.sources = sources;
            result
        }
    });

    let mut results: Vec<LinkCheckResult> = stream::iter(futures)
        .buffer_unordered(checker.concurrency)
        .collect()
        .await;

    results.sort_by(|a, b| a.url.cmp(&b.url));
    results
}

// Checks a single link: HEAD first, GET if the server does not do HEAD
async fn check_single_link(client: Client, url: String) -> LinkCheckResult {
    let mut result = client.head(&url).send().await;

    let head_refused = matches!(
        &result,
        Ok(response) if matches!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
        )
    );
    if head_refused {
        debug!("HEAD refused by {}, retrying with GET", url);
        result = client.get(&url).send().await;
    }

    match result {
        Ok(response) => analyze_response(url, &response),
        Err(e) => categorize_error(url, &e),
    }
}

// Analyzes an HTTP response to determine link status
//
// HTTP status codes:
// - 200-299: Success
// - 300-399: Redirect
// - 404/410: Broken
// - anything else: Error
fn analyze_response(url: String, response: &reqwest::Response) -> LinkCheckResult {
    let status_code = response.status();
    let code = status_code.as_u16();

    let (status, message) = if status_code.is_success() {
        (LinkStatus::Ok, format!("HTTP {}", code))
    } else if status_code.is_redirection() {
        let target = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        let message = format!("HTTP {} -> {}", code, target);
        (LinkStatus::Redirect(target), message)
    } else if matches!(status_code, StatusCode::NOT_FOUND | StatusCode::GONE) {
        (LinkStatus::Broken, format!("HTTP {}", code))
    } else {
        (LinkStatus::Error, format!("HTTP {}", code))
    };

    LinkCheckResult {
        url,
        sources: Vec::new(),
        status,
        http_status: Some(code),
        message: Some(message),
    }
}

// Maps a transport failure onto a link status
fn categorize_error(url: String, error: &reqwest::Error) -> LinkCheckResult {
    let fetch_error = FetchError::classify(error);
    let status = match &fetch_error {
        FetchError::Timeout => LinkStatus::Timeout,
        FetchError::TooManyRedirects => LinkStatus::TooManyRedirects,
        FetchError::Dns => LinkStatus::DnsError,
        FetchError::Tls => LinkStatus::SslError,
        FetchError::Connect | FetchError::Other(_) => LinkStatus::Error,
    };

    LinkCheckResult {
        url,
        sources: Vec::new(),
        status,
        http_status: None,
        message: Some(fetch_error.to_string()),
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why buffer_unordered?
//    - It runs up to N futures at once and yields results as they finish
//    - Order is lost, so results are sorted afterwards
//
// 2. Why clone the client?
//    - Each async task needs its own handle
//    - Client is reference counted internally, clones share one pool
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn checker() -> LinkChecker {
        let config = AuditConfig {
            timeout_secs: 5,
            ..AuditConfig::default()
        };
        LinkChecker::new(&config).unwrap()
    }

    fn pair(source: &str, url: String) -> (String, String) {
        (source.to_string(), url)
    }

    #[tokio::test]
    async fn test_status_classification() {
        let server = MockServer::start().await;
        Mock::given(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(path("/gone"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&server)
            .await;
        Mock::given(path("/moved"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/ok"))
            .mount(&server)
            .await;
        Mock::given(path("/boom"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let base = server.uri();
        let links = vec![
            pair("p", format!("{}/ok", base)),
            pair("p", format!("{}/gone", base)),
            pair("p", format!("{}/moved", base)),
            pair("p", format!("{}/boom", base)),
            pair("p", format!("{}/missing", base)),
        ];
        let results = check_links(&checker(), links).await;
        let status_of = |suffix: &str| {
            results
                .iter()
                .find(|r| r.url.ends_with(suffix))
                .map(|r| r.status.clone())
                .unwrap()
        };

        assert_eq!(status_of("/ok"), LinkStatus::Ok);
        assert_eq!(status_of("/gone"), LinkStatus::Broken);
        assert_eq!(status_of("/moved"), LinkStatus::Redirect("/ok".into()));
        assert_eq!(status_of("/boom"), LinkStatus::Error);
        assert_eq!(status_of("/missing"), LinkStatus::Broken);
    }

    #[tokio::test]
    async fn test_get_fallback_when_head_refused() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/nohead"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/nohead"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let results = check_links(&checker(), vec![pair("p", format!("{}/nohead", server.uri()))]).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_links_checked_once() {
        let server = MockServer::start().await;
        Mock::given(path("/shared"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/shared", server.uri());
        let links = vec![pair("a", url.clone()), pair("b", url.clone()), pair("a", url)];
        let results = check_links(&checker(), links).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].sources, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_not_ok() {
        let results = check_links(&checker(), vec![pair("p", "http://127.0.0.1:9/".into())]).await;
        assert!(!results[0].is_ok());
        assert!(results[0].http_status.is_none());
    }

    #[test]
    fn test_link_result_is_ok() {
        let mut result = LinkCheckResult {
            url: "https://example.com".to_string(),
            sources: vec![],
            status: LinkStatus::Ok,
            http_status: Some(200),
            message: None,
        };
        assert!(result.is_ok());

        result.status = LinkStatus::Redirect("https://example.com/new".into());
        assert!(result.is_ok());

        result.status = LinkStatus::Broken;
        assert!(!result.is_ok());
    }
}
