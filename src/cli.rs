// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Three subcommands:
// - audit:   crawl a site (or read its sitemap) and report SEO issues
// - density: keyword density and top terms of a single page
// - robots:  may a given user agent fetch a path, per the site's robots.txt
//
// Flags given here override values from the YAML config file.
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

// #[derive(Parser)] tells clap to generate the parsing code for us
#[derive(Parser, Debug)]
#[command(
    name = "seo-toolbox",
    version,
    about = "On-page SEO audits and sitemap generation",
    long_about = "seo-toolbox crawls a website (or the URLs of its sitemap.xml), checks every page \
                  for common on-page SEO problems and writes the results as CSV, Markdown and \
                  a freshly generated sitemap.xml."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Audit a website
    ///
    /// Example: seo-toolbox audit --start https://example.com --md-out report.md
    Audit(AuditArgs),

    /// Keyword density of a single page
    ///
    /// Example: seo-toolbox density https://example.com/blog --keyword rust
    Density(DensityArgs),

    /// Test a path against a site's robots.txt
    ///
    /// Example: seo-toolbox robots https://example.com --path /blog --user-agent Googlebot
    Robots(RobotsArgs),
}

#[derive(clap::Args, Debug)]
pub struct AuditArgs {
    /// Start URL of the crawl
    #[arg(long)]
    pub start: Option<String>,

    /// Sitemap URL; its URLs are fetched instead of crawling
    #[arg(long)]
    pub sitemap: Option<String>,

    /// Maximum number of pages to fetch [default: 200, or the config value]
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Follow links to other domains too
    #[arg(long)]
    pub cross_domain: bool,

    /// CSV report path
    #[arg(long, default_value = "audit.csv")]
    pub output: PathBuf,

    /// Markdown summary path
    #[arg(long)]
    pub md_out: Option<PathBuf>,

    /// Write a sitemap.xml of the crawled URLs to this path
    #[arg(long)]
    pub sitemap_out: Option<PathBuf>,

    /// Measure the density of this keyword on every page
    #[arg(long)]
    pub keyword: Option<String>,

    /// Probe every link found on the crawled pages
    #[arg(long)]
    pub check_links: bool,

    /// Ignore robots.txt
    #[arg(long)]
    pub no_robots: bool,

    /// Print the full report as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(clap::Args, Debug)]
pub struct DensityArgs {
    /// Page to analyze
    pub url: String,

    /// Keyword (or phrase) to measure
    #[arg(long)]
    pub keyword: String,

    /// Number of top terms to show
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(clap::Args, Debug)]
pub struct RobotsArgs {
    /// Site root URL
    pub site: String,

    /// Path (or full URL) to test
    #[arg(long, default_value = "/")]
    pub path: String,

    /// Product token to match robots.txt groups against [default: SEO-Toolbox]
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Flags shared by every subcommand
#[derive(clap::Args, Debug)]
pub struct CommonArgs {
    /// YAML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_audit_defaults() {
        let cli = Cli::parse_from(["seo-toolbox", "audit", "--start", "https://a.com"]);
        let Commands::Audit(args) = cli.command else {
            panic!("expected audit");
        };
        assert_eq!(args.start.as_deref(), Some("https://a.com"));
        assert_eq!(args.max_pages, None);
        assert_eq!(args.output, PathBuf::from("audit.csv"));
        assert!(!args.cross_domain && !args.no_robots && !args.check_links);
    }

    #[test]
    fn test_density_args() {
        let cli = Cli::parse_from([
            "seo-toolbox", "density", "https://a.com/p", "--keyword", "rust crate", "--top", "5", "-v",
        ]);
        let Commands::Density(args) = cli.command else {
            panic!("expected density");
        };
        assert_eq!(args.keyword, "rust crate");
        assert_eq!(args.top, 5);
        assert!(args.common.verbose);
    }

    #[test]
    fn test_robots_args() {
        let cli = Cli::parse_from(["seo-toolbox", "robots", "https://a.com"]);
        let Commands::Robots(args) = cli.command else {
            panic!("expected robots");
        };
        assert_eq!(args.site, "https://a.com");
        assert_eq!(args.path, "/");
        assert_eq!(args.user_agent, None);

        let cli = Cli::parse_from([
            "seo-toolbox", "robots", "https://a.com", "--path", "/blog", "--user-agent", "Googlebot",
        ]);
        let Commands::Robots(args) = cli.command else {
            panic!("expected robots");
        };
        assert_eq!(args.path, "/blog");
        assert_eq!(args.user_agent.as_deref(), Some("Googlebot"));
    }
}
