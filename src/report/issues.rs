// src/report/issues.rs
// =============================================================================
// Turns page results and link check results into findings.
//
// A finding is one detected problem tied to the page it was found on. The
// rules are the usual on-page checks: missing or badly sized titles and
// descriptions, duplicates across pages, heading structure, alt text,
// social and structured data tags, thin content, noindex, slow responses,
// failed fetches and broken links.
//
// Content rules only look at 200 HTML pages. A 404 page without a title is
// already reported as a failed fetch.
// =============================================================================

use serde::Serialize;
use std::collections::HashMap;

use crate::analyze::PageResult;
use crate::checker::LinkCheckResult;
use crate::config::Thresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    FetchFailed,
    BrokenLink,
    NoTitle,
    ShortTitle,
    LongTitle,
    DuplicateTitle,
    NoDescription,
    DuplicateDescription,
    NoCanonical,
    BadH1,
    ImgAltMissing,
    NoOpenGraph,
    NoTwitterCard,
    NoJsonLd,
    ThinContent,
    Noindex,
    Slow,
}

impl IssueKind {
    /// Every kind, in report order
    pub const ALL: [IssueKind; 17] = [
        IssueKind::FetchFailed,
        IssueKind::BrokenLink,
        IssueKind::NoTitle,
        IssueKind::ShortTitle,
        IssueKind::LongTitle,
        IssueKind::DuplicateTitle,
        IssueKind::NoDescription,
        IssueKind::DuplicateDescription,
        IssueKind::NoCanonical,
        IssueKind::BadH1,
        IssueKind::ImgAltMissing,
        IssueKind::NoOpenGraph,
        IssueKind::NoTwitterCard,
        IssueKind::NoJsonLd,
        IssueKind::ThinContent,
        IssueKind::Noindex,
        IssueKind::Slow,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            IssueKind::FetchFailed => "Fetch Failed",
            IssueKind::BrokenLink => "Broken Link",
            IssueKind::NoTitle => "No Title",
            IssueKind::ShortTitle => "Short Title",
            IssueKind::LongTitle => "Long Title",
            IssueKind::DuplicateTitle => "Duplicate Title",
            IssueKind::NoDescription => "No Meta Description",
            IssueKind::DuplicateDescription => "Duplicate Meta Description",
            IssueKind::NoCanonical => "No Canonical",
            IssueKind::BadH1 => "H1 Count Not One",
            IssueKind::ImgAltMissing => "Images Missing Alt Text",
            IssueKind::NoOpenGraph => "No Open Graph",
            IssueKind::NoTwitterCard => "No Twitter Card",
            IssueKind::NoJsonLd => "No JSON-LD",
            IssueKind::ThinContent => "Thin Content",
            IssueKind::Noindex => "Noindex",
            IssueKind::Slow => "Slow Response",
        }
    }

    /// Kinds that make the CLI exit with code 1
    pub fn is_blocking(&self) -> bool {
        matches!(self, IssueKind::FetchFailed | IssueKind::BrokenLink)
    }
}

/// A single detected issue on one page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub kind: IssueKind,
    /// The page the issue was found on
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Finding {
    fn new(kind: IssueKind, url: &str) -> Self {
        Self {
            kind,
            url: url.to_string(),
            detail: None,
        }
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Runs every rule over the crawl results
///
/// Findings come out grouped by kind, in `IssueKind::ALL` order, with pages
/// in crawl order inside each group (slow pages: slowest first).
pub fn collect_findings(
    pages: &[PageResult],
    links: &[LinkCheckResult],
    thresholds: &Thresholds,
) -> Vec<Finding> {
    let content: Vec<&PageResult> = pages.iter().filter(|p| p.is_html_ok()).collect();
    let mut findings = Vec::new();

    for kind in IssueKind::ALL {
        match kind {
            IssueKind::FetchFailed => findings.extend(failed_fetches(pages)),
            IssueKind::BrokenLink => findings.extend(broken_links(links)),
            IssueKind::DuplicateTitle => {
                findings.extend(duplicates(&content, kind, |p| &p.title))
            }
            IssueKind::DuplicateDescription => {
                findings.extend(duplicates(&content, kind, |p| &p.meta_desc))
            }
            IssueKind::Slow => findings.extend(slow_pages(pages, thresholds)),
            _ => findings.extend(
                content
                    .iter()
                    .filter_map(|page| check_page(kind, page, thresholds)),
            ),
        }
    }

    findings
}

/// Single-page content rules
fn check_page(kind: IssueKind, page: &PageResult, t: &Thresholds) -> Option<Finding> {
    let finding = Finding::new(kind, &page.url);
    match kind {
        IssueKind::NoTitle => page.title.is_empty().then_some(finding),
        IssueKind::ShortTitle => (page.title_len > 0 && page.title_len < t.title_min)
            .then(|| finding.with_detail(format!("{} chars", page.title_len))),
        IssueKind::LongTitle => (page.title_len > t.title_max || page.title_px > t.title_max_px)
            .then(|| finding.with_detail(format!("{} chars, ~{} px", page.title_len, page.title_px))),
        IssueKind::NoDescription => page.meta_desc.is_empty().then_some(finding),
        IssueKind::NoCanonical => page.canonical.is_empty().then_some(finding),
        IssueKind::BadH1 => (page.h1_count != 1)
            .then(|| finding.with_detail(format!("{} h1 tags", page.h1_count))),
        IssueKind::ImgAltMissing => (page.img_missing_alt > 0).then(|| {
            finding.with_detail(format!("{} of {} images", page.img_missing_alt, page.img_total))
        }),
        IssueKind::NoOpenGraph => (!page.open_graph).then_some(finding),
        IssueKind::NoTwitterCard => (!page.twitter_card).then_some(finding),
        IssueKind::NoJsonLd => page.jsonld_types.is_empty().then_some(finding),
        IssueKind::ThinContent => (page.word_count < t.thin_words)
            .then(|| finding.with_detail(format!("{} words", page.word_count))),
        IssueKind::Noindex => page
            .meta_robots
            .to_lowercase()
            .contains("noindex")
            .then(|| finding.with_detail(page.meta_robots.clone())),
        // Cross-page rules live in their own functions
        IssueKind::FetchFailed
        | IssueKind::BrokenLink
        | IssueKind::DuplicateTitle
        | IssueKind::DuplicateDescription
        | IssueKind::Slow => None,
    }
}

fn failed_fetches(pages: &[PageResult]) -> Vec<Finding> {
    pages
        .iter()
        .filter(|p| p.status == 0 || p.status >= 400)
        .map(|page| {
            let detail = match &page.error {
                Some(error) => error.clone(),
                None => format!("HTTP {}", page.status),
            };
            Finding::new(IssueKind::FetchFailed, &page.url).with_detail(detail)
        })
        .collect()
}

/// One finding per (page, broken link) pair
fn broken_links(links: &[LinkCheckResult]) -> Vec<Finding> {
    let mut findings = Vec::new();
    for link in links.iter().filter(|l| !l.is_ok()) {
        let message = link.message.as_deref().unwrap_or("unreachable");
        for source in &link.sources {
            findings.push(
                Finding::new(IssueKind::BrokenLink, source)
                    .with_detail(format!("{} ({})", link.url, message)),
            );
        }
    }
    findings
}

fn slow_pages(pages: &[PageResult], t: &Thresholds) -> Vec<Finding> {
    let mut slow: Vec<&PageResult> = pages.iter().filter(|p| p.resp_ms >= t.slow_ms).collect();
    slow.sort_by(|a, b| b.resp_ms.cmp(&a.resp_ms));
    slow.into_iter()
        .map(|page| {
            Finding::new(IssueKind::Slow, &page.url).with_detail(format!("{} ms", page.resp_ms))
        })
        .collect()
}

/// Pages sharing the same non-empty value (trimmed, case-insensitive)
fn duplicates<'a, F>(pages: &[&'a PageResult], kind: IssueKind, field: F) -> Vec<Finding>
where
    F: Fn(&'a PageResult) -> &'a String,
{
    let key = |page: &'a PageResult| field(page).trim().to_lowercase();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for &page in pages {
        let k = key(page);
        if !k.is_empty() {
            *counts.entry(k).or_insert(0) += 1;
        }
    }

    pages
        .iter()
        .filter_map(|&page| {
            let n = counts.get(&key(page)).copied().unwrap_or(0);
            (n > 1).then(|| Finding::new(kind, &page.url).with_detail(format!("shared by {} pages", n)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::LinkStatus;

    /// A page that passes every content rule
    fn good_page(url: &str, title: &str) -> PageResult {
        PageResult {
            url: url.to_string(),
            status: 200,
            content_type: "text/html".to_string(),
            resp_ms: 100,
            title: title.to_string(),
            title_len: 55,
            title_px: 400,
            meta_desc: format!("Description of {}", url),
            canonical: url.to_string(),
            h1_count: 1,
            img_total: 2,
            open_graph: true,
            twitter_card: true,
            jsonld_types: vec!["Article".into()],
            word_count: 800,
            ..PageResult::default()
        }
    }

    fn kinds(findings: &[Finding]) -> Vec<IssueKind> {
        findings.iter().map(|f| f.kind).collect()
    }

    #[test]
    fn test_clean_site_has_no_findings() {
        let pages = vec![good_page("https://a.com/", "One"), good_page("https://a.com/2", "Two")];
        assert!(collect_findings(&pages, &[], &Thresholds::default()).is_empty());
    }

    #[test]
    fn test_content_rules() {
        let mut page = good_page("https://a.com/", "");
        page.title_len = 0;
        page.meta_desc.clear();
        page.canonical.clear();
        page.h1_count = 3;
        page.img_missing_alt = 1;
        page.open_graph = false;
        page.twitter_card = false;
        page.jsonld_types.clear();
        page.word_count = 12;
        page.meta_robots = "NOINDEX,follow".into();
        page.resp_ms = 1500;

        let findings = collect_findings(&[page], &[], &Thresholds::default());
        assert_eq!(
            kinds(&findings),
            vec![
                IssueKind::NoTitle,
                IssueKind::NoDescription,
                IssueKind::NoCanonical,
                IssueKind::BadH1,
                IssueKind::ImgAltMissing,
                IssueKind::NoOpenGraph,
                IssueKind::NoTwitterCard,
                IssueKind::NoJsonLd,
                IssueKind::ThinContent,
                IssueKind::Noindex,
                IssueKind::Slow,
            ]
        );
        assert_eq!(findings[3].detail.as_deref(), Some("3 h1 tags"));
    }

    #[test]
    fn test_title_length_rules() {
        let mut short = good_page("https://a.com/s", "Short");
        short.title_len = 5;
        let mut long = good_page("https://a.com/l", "Long");
        long.title_len = 58;
        long.title_px = 640;

        let findings = collect_findings(&[short, long], &[], &Thresholds::default());
        assert_eq!(kinds(&findings), vec![IssueKind::ShortTitle, IssueKind::LongTitle]);
        assert_eq!(findings[1].url, "https://a.com/l");
    }

    #[test]
    fn test_duplicates_case_insensitive() {
        let a = good_page("https://a.com/a", "Same Title");
        let b = good_page("https://a.com/b", "  same title ");
        let c = good_page("https://a.com/c", "Other");

        let findings = collect_findings(&[a, b, c], &[], &Thresholds::default());
        let dupes: Vec<_> = findings
            .iter()
            .filter(|f| f.kind == IssueKind::DuplicateTitle)
            .map(|f| f.url.as_str())
            .collect();
        assert_eq!(dupes, vec!["https://a.com/a", "https://a.com/b"]);
    }

    #[test]
    fn test_failed_pages_skip_content_rules() {
        let failed = PageResult {
            url: "https://a.com/missing".into(),
            status: 404,
            content_type: "text/html".into(),
            ..PageResult::default()
        };
        let dead = PageResult {
            url: "https://a.com/dead".into(),
            status: 0,
            error: Some("request timed out".into()),
            ..PageResult::default()
        };

        let findings = collect_findings(&[failed, dead], &[], &Thresholds::default());
        assert_eq!(kinds(&findings), vec![IssueKind::FetchFailed, IssueKind::FetchFailed]);
        assert_eq!(findings[0].detail.as_deref(), Some("HTTP 404"));
        assert_eq!(findings[1].detail.as_deref(), Some("request timed out"));
        assert!(findings.iter().all(|f| f.kind.is_blocking()));
    }

    #[test]
    fn test_broken_link_per_source() {
        let link = LinkCheckResult {
            url: "https://a.com/gone".into(),
            sources: vec!["https://a.com/".into(), "https://a.com/2".into()],
            status: LinkStatus::Broken,
            http_status: Some(404),
            message: Some("HTTP 404".into()),
        };
        let ok = LinkCheckResult {
            url: "https://a.com/fine".into(),
            sources: vec!["https://a.com/".into()],
            status: LinkStatus::Ok,
            http_status: Some(200),
            message: None,
        };

        let findings = collect_findings(&[], &[link, ok], &Thresholds::default());
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[1].url, "https://a.com/2");
        assert_eq!(findings[1].detail.as_deref(), Some("https://a.com/gone (HTTP 404)"));
    }

    #[test]
    fn test_slow_pages_sorted() {
        let mut a = good_page("https://a.com/a", "A");
        a.resp_ms = 1200;
        let mut b = good_page("https://a.com/b", "B");
        b.resp_ms = 3000;

        let findings = collect_findings(&[a, b], &[], &Thresholds::default());
        let slow: Vec<_> = findings.iter().map(|f| f.url.as_str()).collect();
        assert_eq!(slow, vec!["https://a.com/b", "https://a.com/a"]);
    }
}
