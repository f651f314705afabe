// src/crawl/robots.rs
// =============================================================================
// robots.txt handling.
//
// The file is fetched once per run from the start URL's origin. Matching is
// done by the `robotstxt` crate (a port of Google's matcher) against our
// product token, or any agent the caller names (the `robots` subcommand).
//
// Fetch outcomes:
// - 2xx           -> rules from the body
// - 401 / 403     -> everything disallowed
// - anything else -> everything allowed (no robots.txt means no rules)
// =============================================================================

use robotstxt::DefaultMatcher;
use tracing::{info, warn};
use url::Url;

use super::fetch::Fetcher;
use crate::config::ROBOTS_AGENT;

#[derive(Debug, Clone)]
enum Rules {
    AllowAll,
    DisallowAll,
    Body(String),
}

/// Answers "may this URL be crawled" for one site
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    rules: Rules,
}

impl RobotsPolicy {
    pub fn allow_all() -> Self {
        Self { rules: Rules::AllowAll }
    }

    pub fn from_body(body: impl Into<String>) -> Self {
        Self {
            rules: Rules::Body(body.into()),
        }
    }

    /// Where robots.txt lives for the origin of `url`
    pub fn location(url: &Url) -> Option<Url> {
        url.join("/robots.txt").ok()
    }

    /// Downloads and interprets robots.txt for the origin of `start`
    pub async fn fetch(fetcher: &Fetcher, start: &Url) -> Self {
        let robots_url = match Self::location(start) {
            Some(url) => url,
            None => return Self::allow_all(),
        };

        let page = fetcher.fetch(&robots_url, 0).await;
        match page.status {
            200..=299 => {
                info!("Using robots.txt from {}", robots_url);
                Self::from_body(page.body)
            }
            401 | 403 => {
                warn!("robots.txt is access-restricted ({}), nothing will be crawled", page.status);
                Self { rules: Rules::DisallowAll }
            }
            0 => {
                warn!("Could not fetch {}, crawling without robots rules", robots_url);
                Self::allow_all()
            }
            _ => Self::allow_all(),
        }
    }

    /// True when a robots.txt body was found and is being matched
    pub fn has_rules(&self) -> bool {
        matches!(self.rules, Rules::Body(_))
    }

    pub fn allows(&self, url: &Url) -> bool {
        self.allows_agent(url, ROBOTS_AGENT)
    }

    /// `agent` is a product token such as "Googlebot"
    pub fn allows_agent(&self, url: &Url, agent: &str) -> bool {
        match &self.rules {
            Rules::AllowAll => true,
            Rules::DisallowAll => false,
            Rules::Body(body) => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(body, agent, url.as_str())
            }
        }
    }
}
