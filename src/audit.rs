// src/audit.rs
// =============================================================================
// Runs a complete audit:
//
// 1. Load the sitemap (if given); its first URL becomes the start URL
// 2. Read robots.txt of the start origin (unless disabled)
// 3. Crawl from the start URL, or fetch the sitemap URLs directly
// 4. Analyze every fetched page
// 5. Optionally probe every outbound link
// 6. Apply the issue rules and build the Report
//
// Also home of the single-page runs: keyword density (`density`) and the
// robots.txt check (`robots`).
// =============================================================================

use anyhow::{bail, Context, Result};
use scraper::Html;
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use crate::analyze::{analyze_page, keyword_density, top_terms, visible_text, AnalyzerConfig};
use crate::checker::{check_links, LinkChecker};
use crate::config::{AuditConfig, ROBOTS_AGENT};
use crate::crawl::{crawl_site, fetch_all, load_sitemap, Fetcher, RobotsPolicy};
use crate::report::{collect_findings, Report};

/// What to audit, as given on the command line
#[derive(Debug, Clone, Default)]
pub struct AuditOptions {
    pub start: Option<String>,
    pub sitemap: Option<String>,
    pub keyword: Option<String>,
    pub check_links: bool,
}

pub async fn run_audit(options: &AuditOptions, config: &AuditConfig) -> Result<Report> {
    let fetcher = Fetcher::new(config).context("Failed to build HTTP client")?;

    let sitemap_urls = match &options.sitemap {
        Some(raw) => {
            let sitemap_url = parse_http_url(raw).context("Invalid sitemap URL")?;
            load_sitemap(&fetcher, &sitemap_url).await
        }
        None => Vec::new(),
    };

    let start_raw = match (sitemap_urls.first(), &options.start) {
        (Some(first), _) => first.clone(),
        (None, Some(start)) => start.clone(),
        (None, None) if options.sitemap.is_some() => {
            bail!("Sitemap contained no URLs and no --start was given")
        }
        (None, None) => bail!("Either --start or --sitemap is required"),
    };
    let start = parse_http_url(&start_raw).context("Invalid start URL")?;

    let robots = if config.respect_robots {
        RobotsPolicy::fetch(&fetcher, &start).await
    } else {
        info!("Ignoring robots.txt");
        RobotsPolicy::allow_all()
    };

    let fetched = if sitemap_urls.is_empty() {
        info!("Crawling {} (max {} pages)", start, config.max_pages);
        crawl_site(&fetcher, &robots, &start, config).await
    } else {
        fetch_all(&fetcher, &robots, &sitemap_urls, config).await
    };

    let analyzer = AnalyzerConfig {
        thresholds: config.thresholds.clone(),
        keyword: options.keyword.clone(),
    };
    let pages: Vec<_> = fetched.iter().map(|page| analyze_page(page, &analyzer)).collect();
    info!("Analyzed {} page(s)", pages.len());

    let links = if options.check_links {
        let checker = LinkChecker::new(config).context("Failed to build link checker")?;
        let pairs: Vec<(String, String)> = pages
            .iter()
            .flat_map(|page| {
                page.outbound_links
                    .iter()
                    .map(move |link| (page.url.clone(), link.clone()))
            })
            .collect();
        check_links(&checker, pairs).await
    } else {
        Vec::new()
    };

    let findings = collect_findings(&pages, &links, &config.thresholds);
    info!("{} finding(s)", findings.len());

    Ok(Report::build(pages, links, findings, options.keyword.as_deref()))
}

/// Keyword density of a single page
#[derive(Debug, Clone, Serialize)]
pub struct DensityReport {
    pub url: String,
    pub status: u16,
    pub keyword: String,
    pub word_count: usize,
    pub density: f64,
    pub top_terms: Vec<(String, usize)>,
}

pub async fn run_density(
    url: &str,
    keyword: &str,
    top: usize,
    config: &AuditConfig,
) -> Result<DensityReport> {
    if keyword.trim().is_empty() {
        bail!("Keyword must not be empty");
    }
    let target = parse_http_url(url).context("Invalid URL")?;
    let fetcher = Fetcher::new(config).context("Failed to build HTTP client")?;

    let page = fetcher.fetch(&target, 0).await;
    if let Some(error) = &page.error {
        bail!("Failed to fetch {}: {}", target, error);
    }
    if !page.has_html_body() {
        warn!("{} is not an HTML page, density may be meaningless", target);
    }

    let text = visible_text(&Html::parse_document(&page.body));

    Ok(DensityReport {
        url: target.to_string(),
        status: page.status,
        keyword: keyword.to_string(),
        word_count: text.split_whitespace().count(),
        density: keyword_density(&text, keyword),
        top_terms: top_terms(&text, top),
    })
}

/// Outcome of checking one path against a site's robots.txt
#[derive(Debug, Clone, Serialize)]
pub struct RobotsCheck {
    pub url: String,
    pub robots_url: String,
    pub user_agent: String,
    /// False when robots.txt was missing, unreachable or access-restricted
    pub robots_found: bool,
    pub allowed: bool,
}

/// Resolves `path` against `site` and asks robots.txt whether `agent` may
/// fetch it. A missing agent means our own product token.
pub async fn run_robots_check(
    site: &str,
    path: &str,
    agent: Option<&str>,
    config: &AuditConfig,
) -> Result<RobotsCheck> {
    let base = parse_http_url(site).context("Invalid site URL")?;
    let path = match path.trim() {
        "" => "/",
        path => path,
    };
    let target = base
        .join(path)
        .with_context(|| format!("'{}' is not a valid path", path))?;
    let agent = agent.map(str::trim).filter(|a| !a.is_empty()).unwrap_or(ROBOTS_AGENT);

    let fetcher = Fetcher::new(config).context("Failed to build HTTP client")?;
    let policy = RobotsPolicy::fetch(&fetcher, &target).await;
    let robots_url = RobotsPolicy::location(&target)
        .map(|url| url.to_string())
        .unwrap_or_default();

    Ok(RobotsCheck {
        allowed: policy.allows_agent(&target, agent),
        robots_found: policy.has_rules(),
        url: target.to_string(),
        robots_url,
        user_agent: agent.to_string(),
    })
}

fn parse_http_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("'{}' is not a valid URL", raw))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("'{}' is not an http(s) URL", raw);
    }
    Ok(url)
}
