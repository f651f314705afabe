// src/crawl/fetch.rs
// =============================================================================
// Fetches pages and records everything the audit needs about the response:
// status code, redirect chain, response time, content type and body.
//
// Redirects are followed by hand (the client has redirects disabled) so that
// every hop can be written into the report.
//
// A failed request does not return Err. It produces a FetchedPage with
// status 0 and the classified error, so one dead page never stops a crawl.
// =============================================================================

use anyhow::Result;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect, Client, Response};
use std::error::Error as StdError;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::AuditConfig;

/// Why a request failed before a usable response arrived
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("too many redirects")]
    TooManyRedirects,
    #[error("could not resolve hostname")]
    Dns,
    #[error("SSL certificate error")]
    Tls,
    #[error("connection failed")]
    Connect,
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Sorts a reqwest error into one of the failure kinds
    pub fn classify(error: &reqwest::Error) -> Self {
        // Walk the source chain too: hyper and rustls put the useful
        // wording several levels down
        let mut detail = error.to_string();
        let mut source = StdError::source(error);
        while let Some(inner) = source {
            detail.push_str(": ");
            detail.push_str(&inner.to_string());
            source = inner.source();
        }
        let lowered = detail.to_lowercase();

        if error.is_timeout() {
            FetchError::Timeout
        } else if error.is_redirect() {
            FetchError::TooManyRedirects
        } else if lowered.contains("certificate") || lowered.contains("ssl") || lowered.contains("tls") {
            FetchError::Tls
        } else if error.is_connect() {
            if lowered.contains("dns") || lowered.contains("resolve") {
                FetchError::Dns
            } else {
                FetchError::Connect
            }
        } else {
            FetchError::Other(detail)
        }
    }
}

/// The raw outcome of fetching one URL
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL as requested
    pub url: Url,
    /// URL that finally answered, after redirects
    pub final_url: Url,
    pub depth: usize,
    /// HTTP status, or 0 when the request failed
    pub status: u16,
    pub content_type: Option<String>,
    /// Every URL that answered with a redirect, in order
    pub redirects: Vec<String>,
    pub elapsed_ms: u64,
    pub body: String,
    pub error: Option<FetchError>,
}

impl FetchedPage {
    /// True for a 200 response that declares an HTML body
    pub fn is_html(&self) -> bool {
        self.status == 200 && self.has_html_body()
    }

    /// True when the body is HTML, whatever the status
    pub fn has_html_body(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("text/html"))
            .unwrap_or(false)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Transport failure or an HTTP error status
    pub fn is_failure(&self) -> bool {
        self.status == 0 || self.status >= 400
    }
}

/// Shared HTTP client for pages, robots.txt and sitemaps
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_redirects: usize,
}

impl Fetcher {
    pub fn new(config: &AuditConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            max_redirects: config.max_redirects,
        })
    }

    /// Fetches a URL, following redirects and timing the whole exchange
    pub async fn fetch(&self, url: &Url, depth: usize) -> FetchedPage {
        let started = Instant::now();
        let mut redirects = Vec::new();
        let mut current = url.clone();

        let outcome = loop {
            let response = match self.client.get(current.clone()).send().await {
                Ok(response) => response,
                Err(e) => break Err(FetchError::classify(&e)),
            };

            if response.status().is_redirection() {
                if let Some(next) = redirect_target(&current, &response) {
                    if redirects.len() >= self.max_redirects {
                        break Err(FetchError::TooManyRedirects);
                    }
                    redirects.push(current.to_string());
                    current = next;
                    continue;
                }
            }

            let status = response.status().as_u16();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            match response.text().await {
                Ok(body) => break Ok((status, content_type, body)),
                Err(e) => break Err(FetchError::classify(&e)),
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok((status, content_type, body)) => {
                debug!(url = %url, status, elapsed_ms, "fetched");
                FetchedPage {
                    url: url.clone(),
                    final_url: current,
                    depth,
                    status,
                    content_type,
                    redirects,
                    elapsed_ms,
                    body,
                    error: None,
                }
            }
            Err(error) => {
                debug!(url = %url, %error, elapsed_ms, "fetch failed");
                FetchedPage {
                    url: url.clone(),
                    final_url: current,
                    depth,
                    status: 0,
                    content_type: None,
                    redirects,
                    elapsed_ms,
                    body: String::new(),
                    error: Some(error),
                }
            }
        }
    }
}

fn redirect_target(current: &Url, response: &Response) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}
