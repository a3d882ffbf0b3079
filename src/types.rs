//! Shared data model: crawl status, results, and resource stats.

use serde::{Deserialize, Serialize};

/// Outcome of a single URL fetch.
///
/// Only `Success`, `Failed`, and `Timeout` ever appear on a finished
/// `CrawlResult`; `Pending`/`InProgress` describe scheduler-internal state
/// before a fetch completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CrawlStatus {
    Pending,
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    Success,
    Failed,
    Timeout,
}

impl std::fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CrawlStatus::Pending => "PENDING",
            CrawlStatus::InProgress => "IN_PROGRESS",
            CrawlStatus::Success => "SUCCESS",
            CrawlStatus::Failed => "FAILED",
            CrawlStatus::Timeout => "TIMEOUT",
        };
        f.write_str(name)
    }
}

/// Result of fetching a single URL through the rendered-page pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub url: String,
    pub status: CrawlStatus,
    pub initial_html_bytes: u64,
    pub rendered_html_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_sec: f64,
}

impl CrawlResult {
    #[must_use]
    pub fn success(url: String, initial_html_bytes: u64, rendered_html_bytes: u64, elapsed_sec: f64) -> Self {
        Self {
            url,
            status: CrawlStatus::Success,
            initial_html_bytes,
            rendered_html_bytes,
            error: None,
            elapsed_sec,
        }
    }

    #[must_use]
    pub fn failed(url: String, error: String, elapsed_sec: f64) -> Self {
        Self {
            url,
            status: CrawlStatus::Failed,
            initial_html_bytes: 0,
            rendered_html_bytes: 0,
            error: Some(error),
            elapsed_sec,
        }
    }

    #[must_use]
    pub fn timeout(
        url: String,
        initial_html_bytes: u64,
        rendered_html_bytes: u64,
        error: String,
        elapsed_sec: f64,
    ) -> Self {
        Self {
            url,
            status: CrawlStatus::Timeout,
            initial_html_bytes,
            rendered_html_bytes,
            error: Some(error),
            elapsed_sec,
        }
    }
}

/// Live CPU/memory sample used by the admission controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceStats {
    pub cpu_pct: f64,
    pub mem_pct: f64,
    pub mem_avail_mb: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_as_uppercase_variant_name() {
        let json = serde_json::to_string(&CrawlStatus::Success).unwrap();
        assert_eq!(json, "\"SUCCESS\"");
        let json = serde_json::to_string(&CrawlStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
    }

    #[test]
    fn result_error_omitted_when_absent() {
        let r = CrawlResult::success("https://a.com".into(), 10, 20, 0.5);
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("error").is_none());
    }
}
