//! Summary statistics printed after a crawl run.
//!
//! Only the one-shot end-of-run summary lives here. Percentile/CDF analysis
//! over a previously-saved result file is a separate offline concern and not
//! part of this.

use crate::types::{CrawlResult, CrawlStatus};

/// Print a one-shot summary of a finished crawl to stdout.
pub fn print_stats(results: &[CrawlResult]) {
    let n_total = results.len();
    let n_success = results.iter().filter(|r| r.status == CrawlStatus::Success).count();
    let n_timeout = results.iter().filter(|r| r.status == CrawlStatus::Timeout).count();
    let n_failed = results.iter().filter(|r| r.status == CrawlStatus::Failed).count();

    let init_bytes: Vec<u64> = results
        .iter()
        .map(|r| r.initial_html_bytes)
        .filter(|&b| b > 0)
        .collect();
    let rend_bytes: Vec<u64> = results
        .iter()
        .map(|r| r.rendered_html_bytes)
        .filter(|&b| b > 0)
        .collect();

    println!("\n=== Crawl Stats ===");
    println!("Total: {n_total}, Success: {n_success}, Timeout: {n_timeout}, Failed: {n_failed}");
    if let Some(summary) = byte_summary(&init_bytes) {
        println!("Initial HTML: {summary}");
    }
    if let Some(summary) = byte_summary(&rend_bytes) {
        println!("Rendered HTML: {summary}");
    }
}

fn byte_summary(bytes: &[u64]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    let min = bytes.iter().min().copied().unwrap_or(0);
    let max = bytes.iter().max().copied().unwrap_or(0);
    let avg = bytes.iter().sum::<u64>() / bytes.len() as u64;
    Some(format!("min={min}, max={max}, avg={avg}"))
}
