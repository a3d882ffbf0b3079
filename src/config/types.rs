//! Core configuration types for the crawler
//!
//! This module contains the main `CrawlerConfig` struct and its associated
//! defaults. Every field has a sensible default, so construction never fails.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tunables for the politeness scheduler, admission controller, and browser
/// supervisor. All fields have defaults matching the reference crawler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Minimum spacing between successive requests to the same domain.
    pub(crate) domain_delay_sec: f64,
    /// Per-page navigation + idle budget.
    pub(crate) page_timeout_sec: f64,
    /// Upper bound on CPU utilization (%) for admission.
    pub(crate) cpu_threshold: f64,
    /// Upper bound on memory utilization (%) for admission.
    pub(crate) mem_threshold: f64,
    /// Lower bound on available memory (MB) for admission.
    pub(crate) min_mem_avail_mb: f64,
    /// Consecutive non-transient failures before the browser engine restarts.
    pub(crate) max_failures: u32,
    /// Path the final result JSON is written to.
    pub(crate) result_path: PathBuf,
    /// Launch the browser engine headless.
    pub(crate) headless: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            domain_delay_sec: 60.0,
            page_timeout_sec: 60.0,
            cpu_threshold: 80.0,
            mem_threshold: 80.0,
            min_mem_avail_mb: 512.0,
            max_failures: 3,
            result_path: PathBuf::from("crawl_results.json"),
            headless: true,
        }
    }
}
