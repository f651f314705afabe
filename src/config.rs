// src/config.rs
// =============================================================================
// Runtime configuration for an audit run.
//
// Every field has a default, so a config file only needs the values it wants
// to change. Files are YAML and are loaded with serde_yaml. Command-line
// flags are applied on top of whatever the file says (see main.rs).
//
// Rust concepts:
// - #[serde(default)]: missing fields fall back to Default::default()
// - thiserror: typed error enums with Display generated for us
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Browser-like user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36 SEO-Toolbox/1.0";

/// Product token matched against robots.txt user-agent groups.
pub const ROBOTS_AGENT: &str = "SEO-Toolbox";

/// Errors raised while loading or validating a config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything that tunes a crawl, the checks and the reports
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuditConfig {
    pub user_agent: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Redirect hops followed before a fetch gives up
    pub max_redirects: usize,
    /// Concurrent page fetches in sitemap mode
    pub workers: usize,
    /// Concurrent link probes
    pub link_workers: usize,
    /// Pause between two crawl fetches, in milliseconds
    pub politeness_delay_ms: u64,
    pub respect_robots: bool,
    pub max_pages: usize,
    /// Only follow links on the start URL's site
    pub same_site_only: bool,
    pub thresholds: Thresholds,
}

/// Limits used by the page checks and the Markdown report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    pub title_min: usize,
    pub title_max: usize,
    /// Estimated pixel width above which a title is truncated in results
    pub title_max_px: usize,
    pub desc_min: usize,
    pub desc_max: usize,
    /// Pages with fewer visible words are thin content
    pub thin_words: usize,
    /// Responses at or above this many milliseconds are slow
    pub slow_ms: u64,
    /// URLs listed per issue in the Markdown report
    pub top_n: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 15,
            max_redirects: 10,
            workers: 8,
            link_workers: 50,
            politeness_delay_ms: 100,
            respect_robots: true,
            max_pages: 200,
            same_site_only: true,
            thresholds: Thresholds::default(),
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            title_min: 50,
            title_max: 60,
            title_max_px: 600,
            desc_min: 120,
            desc_max: 160,
            thin_words: 300,
            slow_ms: 1000,
            top_n: 20,
        }
    }
}

impl AuditConfig {
    /// Loads the config from a YAML file, or returns the defaults when no
    /// path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading configuration from: {}", path.display());

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Rejects values that would make a run meaningless or hang
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pages == 0 {
            return Err(ConfigError::Invalid("max_pages must be at least 1".into()));
        }
        if self.workers == 0 || self.link_workers == 0 {
            return Err(ConfigError::Invalid("worker counts must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be at least 1".into()));
        }
        let t = &self.thresholds;
        if t.title_min > t.title_max {
            return Err(ConfigError::Invalid(format!(
                "title range {}..{} is empty",
                t.title_min, t.title_max
            )));
        }
        if t.desc_min > t.desc_max {
            return Err(ConfigError::Invalid(format!(
                "description range {}..{} is empty",
                t.desc_min, t.desc_max
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AuditConfig::load(None).unwrap();
        assert_eq!(config.max_pages, 200);
        assert_eq!(config.thresholds.title_min, 50);
        assert!(config.respect_robots);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_pages: 25\nthresholds:\n  thin_words: 150").unwrap();

        let config = AuditConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.max_pages, 25);
        assert_eq!(config.thresholds.thin_words, 150);
        assert_eq!(config.thresholds.desc_max, 160);
        assert_eq!(config.workers, 8);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = AuditConfig::load(Some(Path::new("/nonexistent/seo.yaml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_bad_yaml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_pages: [not a number").unwrap();

        let result = AuditConfig::load(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_zero_pages_rejected() {
        let config = AuditConfig {
            max_pages: 0,
            ..AuditConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
