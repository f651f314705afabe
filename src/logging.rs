// src/logging.rs
// =============================================================================
// Sets up tracing for the whole program.
//
// Logs go to stderr so that `--json` output on stdout stays machine-readable.
// A non-empty RUST_LOG replaces the defaults entirely, e.g.
// RUST_LOG=seo_toolbox=trace,reqwest=debug. Without it: warnings from every
// crate, and info (debug with -v) from our own.
// =============================================================================

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the logging system
pub fn init_logging(verbose: bool) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let env_filter = build_filter(verbose, rust_log.as_deref())?;

    let fmt_layer = fmt::layer()
        .with_target(verbose)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("warn,seo_toolbox={}", level)
}

fn build_filter(verbose: bool, rust_log: Option<&str>) -> Result<EnvFilter> {
    match rust_log.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("Invalid RUST_LOG '{}'", directives)),
        None => Ok(EnvFilter::try_new(default_directives(verbose))?),
    }
}
