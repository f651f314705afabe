// src/checker/mod.rs
// =============================================================================
// This module contains all link checking logic.
//
// Submodules:
// - http: Makes HTTP requests to check if links are alive
// - html: Extracts links from HTML pages
// =============================================================================

mod html;
mod http;

pub use html::extract_html_links;
pub use http::{check_links, LinkCheckResult, LinkChecker, LinkStatus};
