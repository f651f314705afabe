// src/report/csv_export.rs
// =============================================================================
// CSV export, one row per page.
//
// Columns follow the PageResult field order. List fields are flattened into
// a single cell: redirects joined with " -> ", h1 texts with " | ", JSON-LD
// types with ", " and top terms as "term:count" pairs.
// =============================================================================

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

use crate::analyze::PageResult;

/// Flat view of a PageResult as it appears in the CSV
#[derive(Serialize)]
struct CsvRow<'a> {
    url: &'a str,
    depth: usize,
    status: u16,
    content_type: &'a str,
    resp_ms: u64,
    redirects: String,
    bytes_kb: f64,
    title: &'a str,
    title_len: usize,
    title_px: usize,
    title_ok: bool,
    meta_desc: &'a str,
    meta_desc_len: usize,
    meta_desc_ok: bool,
    meta_robots: &'a str,
    canonical: &'a str,
    self_canonical: bool,
    h1_count: usize,
    h1_texts: String,
    h2_count: usize,
    h3_count: usize,
    h4_count: usize,
    h5_count: usize,
    h6_count: usize,
    img_total: usize,
    img_missing_alt: usize,
    links_internal: usize,
    links_external: usize,
    links_nofollow: usize,
    open_graph: bool,
    twitter_card: bool,
    hreflang_count: usize,
    jsonld_types: String,
    word_count: usize,
    keyword_density: Option<String>,
    top_terms: String,
    error: &'a str,
}

impl<'a> From<&'a PageResult> for CsvRow<'a> {
    fn from(page: &'a PageResult) -> Self {
        Self {
            url: &page.url,
            depth: page.depth,
            status: page.status,
            content_type: &page.content_type,
            resp_ms: page.resp_ms,
            redirects: page.redirects.join(" -> "),
            bytes_kb: page.bytes_kb,
            title: &page.title,
            title_len: page.title_len,
            title_px: page.title_px,
            title_ok: page.title_ok,
            meta_desc: &page.meta_desc,
            meta_desc_len: page.meta_desc_len,
            meta_desc_ok: page.meta_desc_ok,
            meta_robots: &page.meta_robots,
            canonical: &page.canonical,
            self_canonical: page.self_canonical,
            h1_count: page.h1_count,
            h1_texts: page.h1_texts.join(" | "),
            h2_count: page.h2_count,
            h3_count: page.h3_count,
            h4_count: page.h4_count,
            h5_count: page.h5_count,
            h6_count: page.h6_count,
            img_total: page.img_total,
            img_missing_alt: page.img_missing_alt,
            links_internal: page.links_internal,
            links_external: page.links_external,
            links_nofollow: page.links_nofollow,
            open_graph: page.open_graph,
            twitter_card: page.twitter_card,
            hreflang_count: page.hreflang_count,
            jsonld_types: page.jsonld_types.join(", "),
            word_count: page.word_count,
            keyword_density: page.keyword_density.map(|d| format!("{:.2}", d)),
            top_terms: page
                .top_terms
                .iter()
                .map(|(term, count)| format!("{}:{}", term, count))
                .collect::<Vec<_>>()
                .join(", "),
            error: page.error.as_deref().unwrap_or(""),
        }
    }
}

/// Writes the header and one row per page, returns the number of rows
///
/// An empty page list writes nothing at all, not even the header.
pub fn write_csv<W: Write>(pages: &[PageResult], writer: W) -> Result<usize> {
    if pages.is_empty() {
        warn!("No pages to write to CSV");
        return Ok(0);
    }

    let mut csv_writer = csv::Writer::from_writer(writer);
    for page in pages {
        csv_writer
            .serialize(CsvRow::from(page))
            .with_context(|| format!("Failed to write CSV row for {}", page.url))?;
    }
    csv_writer.flush().context("Failed to flush CSV output")?;

    Ok(pages.len())
}

/// Same as `write_csv`, creating (or truncating) the file at `path`
pub fn write_csv_file(pages: &[PageResult], path: &Path) -> Result<usize> {
    if pages.is_empty() {
        warn!("No pages to write, {} not created", path.display());
        return Ok(0);
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
    let rows = write_csv(pages, file)?;
    info!("Wrote {} row(s) to {}", rows, path.display());
    Ok(rows)
}
