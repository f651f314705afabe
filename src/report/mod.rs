// src/report/mod.rs
// =============================================================================
// The final result of an audit run and its exporters.
//
// A Report bundles every page result, every link check result and every
// finding, plus summary statistics computed once when the report is built.
// After that it is only read: written to CSV, rendered to Markdown, turned
// into a sitemap, or printed as JSON.
// =============================================================================

mod csv_export;
mod issues;
mod markdown;
mod sitemap;

pub use csv_export::{write_csv, write_csv_file};
pub use issues::{collect_findings, Finding, IssueKind};
pub use markdown::render_markdown;
pub use sitemap::build_sitemap;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::analyze::PageResult;
use crate::checker::LinkCheckResult;

/// Aggregate numbers shown at the top of every report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_pages: usize,
    /// "2xx", "3xx", "4xx", "5xx" or "failed" (no response at all)
    pub pages_by_status: BTreeMap<String, usize>,
    pub avg_resp_ms: f64,
    pub max_resp_ms: u64,
    pub total_words: usize,
    pub links_checked: usize,
    pub broken_links: usize,
    pub findings: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    /// Mean density over the HTML pages it was measured on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_keyword_density: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub summary: Summary,
    pub pages: Vec<PageResult>,
    pub links: Vec<LinkCheckResult>,
    pub findings: Vec<Finding>,
}

impl Report {
    pub fn build(
        pages: Vec<PageResult>,
        links: Vec<LinkCheckResult>,
        findings: Vec<Finding>,
        keyword: Option<&str>,
    ) -> Self {
        let mut pages_by_status = BTreeMap::new();
        for page in &pages {
            *pages_by_status.entry(status_class(page.status)).or_insert(0) += 1;
        }

        let total_ms: u64 = pages.iter().map(|p| p.resp_ms).sum();
        let avg_resp_ms = if pages.is_empty() {
            0.0
        } else {
            total_ms as f64 / pages.len() as f64
        };

        let densities: Vec<f64> = pages.iter().filter_map(|p| p.keyword_density).collect();
        let avg_keyword_density = match keyword {
            Some(_) if !densities.is_empty() => {
                Some(densities.iter().sum::<f64>() / densities.len() as f64)
            }
            Some(_) => Some(0.0),
            None => None,
        };

        let summary = Summary {
            total_pages: pages.len(),
            pages_by_status,
            avg_resp_ms,
            max_resp_ms: pages.iter().map(|p| p.resp_ms).max().unwrap_or(0),
            total_words: pages.iter().map(|p| p.word_count).sum(),
            links_checked: links.len(),
            broken_links: links.iter().filter(|l| !l.is_ok()).count(),
            findings: findings.len(),
            keyword: keyword.map(str::to_string),
            avg_keyword_density,
        };

        Self {
            summary,
            pages,
            links,
            findings,
        }
    }

    /// True when a page failed to load or a link is broken
    pub fn has_blocking_issues(&self) -> bool {
        self.findings.iter().any(|f| f.kind.is_blocking())
    }

    /// Findings of one kind, in report order
    pub fn findings_of(&self, kind: IssueKind) -> Vec<&Finding> {
        self.findings.iter().filter(|f| f.kind == kind).collect()
    }

    /// URLs of the pages that answered 2xx, in crawl order
    pub fn crawled_urls(&self) -> Vec<&str> {
        self.pages
            .iter()
            .filter(|p| (200..300).contains(&p.status))
            .map(|p| p.url.as_str())
            .collect()
    }

    /// The `n` slowest pages, slowest first
    pub fn slowest(&self, n: usize) -> Vec<&PageResult> {
        let mut pages: Vec<&PageResult> = self.pages.iter().collect();
        pages.sort_by(|a, b| b.resp_ms.cmp(&a.resp_ms));
        pages.truncate(n);
        pages
    }
}

fn status_class(status: u16) -> String {
    match status {
        0 => "failed".to_string(),
        s => format!("{}xx", s / 100),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::LinkStatus;

    fn page(url: &str, status: u16, resp_ms: u64, words: usize) -> PageResult {
        PageResult {
            url: url.to_string(),
            status,
            resp_ms,
            word_count: words,
            ..PageResult::default()
        }
    }

    #[test]
    fn test_summary() {
        let mut with_kw = page("https://a.com/", 200, 100, 400);
        with_kw.keyword_density = Some(2.0);
        let mut other = page("https://a.com/x", 200, 300, 100);
        other.keyword_density = Some(1.0);
        let pages = vec![with_kw, other, page("https://a.com/gone", 404, 50, 0), page("https://a.com/dead", 0, 0, 0)];

        let links = vec![LinkCheckResult {
            url: "https://a.com/gone".into(),
            sources: vec!["https://a.com/".into()],
            status: LinkStatus::Broken,
            http_status: Some(404),
            message: None,
        }];

        let report = Report::build(pages, links, vec![], Some("rust"));
        let s = &report.summary;

        assert_eq!(s.total_pages, 4);
        assert_eq!(s.pages_by_status.get("2xx"), Some(&2));
        assert_eq!(s.pages_by_status.get("4xx"), Some(&1));
        assert_eq!(s.pages_by_status.get("failed"), Some(&1));
        assert_eq!(s.avg_resp_ms, 112.5);
        assert_eq!(s.max_resp_ms, 300);
        assert_eq!(s.total_words, 500);
        assert_eq!(s.broken_links, 1);
        assert_eq!(s.avg_keyword_density, Some(1.5));
        assert_eq!(report.crawled_urls(), vec!["https://a.com/", "https://a.com/x"]);
    }

    #[test]
    fn test_empty_report() {
        let report = Report::build(vec![], vec![], vec![], None);
        assert_eq!(report.summary.avg_resp_ms, 0.0);
        assert_eq!(report.summary.avg_keyword_density, None);
        assert!(!report.has_blocking_issues());
    }

    #[test]
    fn test_blocking_and_slowest() {
        let pages = vec![page("https://a.com/1", 200, 10, 0), page("https://a.com/2", 200, 900, 0)];
        let findings = vec![
            Finding {
                kind: IssueKind::NoTitle,
                url: "https://a.com/1".into(),
                detail: None,
            },
            Finding {
                kind: IssueKind::FetchFailed,
                url: "https://a.com/3".into(),
                detail: Some("HTTP 500".into()),
            },
        ];
        let report = Report::build(pages, vec![], findings, None);

        assert!(report.has_blocking_issues());
        assert_eq!(report.findings_of(IssueKind::NoTitle).len(), 1);
        assert_eq!(report.slowest(1)[0].url, "https://a.com/2");
    }
}
