// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging and load the configuration (file + CLI overrides)
// 3. Dispatch to the appropriate subcommand handler
// 4. Write the reports and print a summary
// 5. Exit with proper code (0 = clean, 1 = failed pages or broken links,
//    or a path robots.txt disallows, 2 = error)
// =============================================================================

// Module declarations - tells Rust about our other source files
mod analyze;  // src/analyze/ - per-page SEO signals and keyword density
mod audit;    // src/audit.rs - wires crawl, analysis and report together
mod checker;  // src/checker/ - link extraction and link probing
mod cli;      // src/cli.rs - command-line parsing
mod config;   // src/config.rs - YAML configuration
mod crawl;    // src/crawl/ - frontier, fetcher, robots.txt and sitemaps
mod logging;  // src/logging.rs - tracing setup
mod report;   // src/report/ - findings, CSV, Markdown and sitemap output

use anyhow::{Context, Result};
use clap::Parser; // Parser trait enables the parse() method
use std::fs;
use tracing::info;

use audit::{AuditOptions, DensityReport, RobotsCheck};
use cli::{AuditArgs, Cli, Commands, DensityArgs, RobotsArgs};
use config::AuditConfig;
use report::{IssueKind, Report};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = audit finished, no failed pages or broken links
//   Ok(1) = failed pages or broken links found (robots: path disallowed)
//   Err   = anything else (mapped to exit code 2 in main)
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Audit(args) => handle_audit(args).await,
        Commands::Density(args) => handle_density(args).await,
        Commands::Robots(args) => handle_robots(args).await,
    }
}

// Handles the 'audit' subcommand
async fn handle_audit(args: AuditArgs) -> Result<i32> {
    logging::init_logging(args.common.verbose)?;

    let mut config = AuditConfig::load(args.common.config.as_deref())?;
    if let Some(max_pages) = args.max_pages {
        config.max_pages = max_pages;
    }
    if args.cross_domain {
        config.same_site_only = false;
    }
    if args.no_robots {
        config.respect_robots = false;
    }
    config.validate()?;

    let options = AuditOptions {
        start: args.start,
        sitemap: args.sitemap,
        keyword: args.keyword,
        check_links: args.check_links,
    };

    let report = audit::run_audit(&options, &config).await?;

    report::write_csv_file(&report.pages, &args.output)?;

    if let Some(path) = &args.md_out {
        let markdown = report::render_markdown(&report, config.thresholds.top_n);
        fs::write(path, markdown)
            .with_context(|| format!("Failed to write Markdown report {}", path.display()))?;
        info!("Markdown report written to {}", path.display());
    }

    if let Some(path) = &args.sitemap_out {
        let urls = report.crawled_urls();
        let xml = report::build_sitemap(&urls[..], chrono::Utc::now());
        fs::write(path, xml)
            .with_context(|| format!("Failed to write sitemap {}", path.display()))?;
        info!("Sitemap written to {}", path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.has_blocking_issues() {
        Ok(1)
    } else {
        Ok(0)
    }
}

// Handles the 'density' subcommand
async fn handle_density(args: DensityArgs) -> Result<i32> {
    logging::init_logging(args.common.verbose)?;
    let config = AuditConfig::load(args.common.config.as_deref())?;

    let result = audit::run_density(&args.url, &args.keyword, args.top, &config).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_density(&result);
    }
    Ok(0)
}

// Handles the 'robots' subcommand
async fn handle_robots(args: RobotsArgs) -> Result<i32> {
    logging::init_logging(args.common.verbose)?;
    let config = AuditConfig::load(args.common.config.as_deref())?;

    let check =
        audit::run_robots_check(&args.site, &args.path, args.user_agent.as_deref(), &config)
            .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&check)?);
    } else {
        print_robots(&check);
    }
    Ok(if check.allowed { 0 } else { 1 })
}

// Prints the findings as a table, then the summary
fn print_report(report: &Report) {
    if !report.findings.is_empty() {
        println!("{:<28} {:<60} {:<40}", "ISSUE", "URL", "DETAIL");
        println!("{}", "=".repeat(130));

        for finding in &report.findings {
            println!(
                "{:<28} {:<60} {:<40}",
                finding.kind.label(),
                truncate(&finding.url, 58),
                finding.detail.as_deref().unwrap_or("")
            );
        }
        println!();
    }

    let s = &report.summary;
    println!("📊 Summary:");
    println!("   📄 Pages: {}", s.total_pages);
    for (class, count) in &s.pages_by_status {
        println!("      {}: {}", class, count);
    }
    println!("   ⏱️  Avg response: {:.0} ms (max {} ms)", s.avg_resp_ms, s.max_resp_ms);
    println!("   📝 Words: {}", s.total_words);
    if s.links_checked > 0 {
        println!("   🔗 Links checked: {} ({} broken)", s.links_checked, s.broken_links);
    }
    if let (Some(keyword), Some(density)) = (&s.keyword, s.avg_keyword_density) {
        println!("   🔑 \"{}\" density: {:.2}%", keyword, density);
    }

    let blocking = report
        .findings
        .iter()
        .filter(|f| f.kind.is_blocking())
        .count();
    println!("   ⚠️  Findings: {} ({} blocking)", s.findings, blocking);

    for kind in [IssueKind::FetchFailed, IssueKind::BrokenLink] {
        let count = report.findings_of(kind).len();
        if count > 0 {
            println!("   ❌ {}: {}", kind.label(), count);
        }
    }
}

fn print_density(result: &DensityReport) {
    println!("🔍 {} (HTTP {})", result.url, result.status);
    println!("   Words: {}", result.word_count);
    println!("   \"{}\": {:.2}%", result.keyword, result.density);
    println!();
    println!("{:<30} {:>8}", "TERM", "COUNT");
    println!("{}", "=".repeat(39));
    for (term, count) in &result.top_terms {
        println!("{:<30} {:>8}", term, count);
    }
}

fn print_robots(check: &RobotsCheck) {
    let verdict = if check.allowed { "✅ ALLOW" } else { "❌ DISALLOW" };
    println!("{}  {}", verdict, check.url);
    println!("   User-agent: {}", check.user_agent);
    if check.robots_found {
        println!("   Rules: {}", check.robots_url);
    } else {
        println!("   Rules: none ({} not usable)", check.robots_url);
    }
}

// Shortens long values for the terminal, on a char boundary
fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() > max_chars {
        let cut: String = value.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        value.to_string()
    }
}
