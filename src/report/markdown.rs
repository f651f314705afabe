// src/report/markdown.rs
// =============================================================================
// Markdown summary of a report.
//
// Layout:
//   # SEO Audit Summary (Total Pages: N)
//   ## Overview             summary table
//   ## <Issue> (n)          one section per issue kind that has findings
//   ## 10 Slowest Pages     response times, slowest first
//   ## Keyword Density      only when a keyword was given
// =============================================================================

use std::fmt::{self, Write};

use super::{IssueKind, Report};

/// Pages listed in the slowest-pages section
const SLOWEST: usize = 10;

/// Renders the report, listing at most `top_n` URLs per issue kind
pub fn render_markdown(report: &Report, top_n: usize) -> String {
    let mut out = String::new();
    // fmt::Write for String never returns Err
    let _ = write_report(&mut out, report, top_n);
    out
}

fn write_report<W: Write>(out: &mut W, report: &Report, top_n: usize) -> fmt::Result {
    let s = &report.summary;

    writeln!(out, "# SEO Audit Summary (Total Pages: {})\n", s.total_pages)?;

    writeln!(out, "## Overview\n")?;
    writeln!(out, "| Metric | Value |")?;
    writeln!(out, "|---|---|")?;
    writeln!(out, "| Pages crawled | {} |", s.total_pages)?;
    for (class, count) in &s.pages_by_status {
        writeln!(out, "| Status {} | {} |", class, count)?;
    }
    writeln!(out, "| Average response | {:.0} ms |", s.avg_resp_ms)?;
    writeln!(out, "| Slowest response | {} ms |", s.max_resp_ms)?;
    writeln!(out, "| Total words | {} |", s.total_words)?;
    writeln!(out, "| Links checked | {} |", s.links_checked)?;
    writeln!(out, "| Broken links | {} |", s.broken_links)?;
    writeln!(out, "| Findings | {} |", s.findings)?;
    writeln!(out)?;

    for kind in IssueKind::ALL {
        let findings = report.findings_of(kind);
        if findings.is_empty() {
            continue;
        }

        writeln!(out, "## {} ({})\n", kind.label(), findings.len())?;
        for finding in findings.iter().take(top_n) {
            match &finding.detail {
                Some(detail) => writeln!(out, "- {} ({})", finding.url, detail)?,
                None => writeln!(out, "- {}", finding.url)?,
            }
        }
        if findings.len() > top_n {
            writeln!(out, "\n… and {} more.", findings.len() - top_n)?;
        }
        writeln!(out)?;
    }

    let slowest = report.slowest(SLOWEST);
    if !slowest.is_empty() {
        writeln!(out, "## {} Slowest Pages (ms)\n", SLOWEST)?;
        for page in slowest {
            writeln!(out, "- `{:>6} ms` {}", page.resp_ms, page.url)?;
        }
        writeln!(out)?;
    }

    if let Some(keyword) = &s.keyword {
        writeln!(out, "## Keyword Density: \"{}\"\n", keyword)?;
        writeln!(
            out,
            "Average over HTML pages: {:.2}%\n",
            s.avg_keyword_density.unwrap_or(0.0)
        )?;

        let mut measured: Vec<_> = report
            .pages
            .iter()
            .filter_map(|p| p.keyword_density.map(|d| (d, p.url.as_str())))
            .collect();
        measured.sort_by(|a, b| b.0.total_cmp(&a.0));

        if !measured.is_empty() {
            writeln!(out, "| Page | Density |")?;
            writeln!(out, "|---|---|")?;
            for (density, url) in measured.into_iter().take(top_n) {
                writeln!(out, "| {} | {:.2}% |", url, density)?;
            }
            writeln!(out)?;
        }
    }

    Ok(())
}
