//! URL file loading and result serialization.
//!
//! I/O errors never propagate raw; both entry points wrap them in
//! `CrawlerError`.

use std::path::Path;

use serde::Serialize;

use crate::error::{CrawlerError, Result};
use crate::types::CrawlResult;

/// Read one URL per line, skipping blank lines, trimming whitespace, and
/// optionally truncating to the first `limit` URLs.
pub fn load_urls(path: &Path, limit: Option<usize>) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path).map_err(|source| CrawlerError::UrlFile {
        path: path.to_path_buf(),
        source,
    })?;

    let mut urls: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    if let Some(limit) = limit {
        urls.truncate(limit);
    }

    log::info!("loaded {} urls from {}", urls.len(), path.display());
    Ok(urls)
}

#[derive(Debug, Serialize)]
struct RunMetadata {
    wall_clock_sec: f64,
    n_urls: usize,
}

#[derive(Debug, Serialize)]
struct ResultFile<'a> {
    metadata: RunMetadata,
    results: &'a [CrawlResult],
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Write results and run metadata as JSON, rounding `elapsed_sec` and
/// `wall_clock_sec` to 2 decimals.
pub fn save_results(results: &[CrawlResult], path: &Path, wall_clock_sec: f64) -> Result<()> {
    let rounded: Vec<CrawlResult> = results
        .iter()
        .cloned()
        .map(|mut r| {
            r.elapsed_sec = round2(r.elapsed_sec);
            r
        })
        .collect();

    let payload = ResultFile {
        metadata: RunMetadata {
            wall_clock_sec: round2(wall_clock_sec),
            n_urls: rounded.len(),
        },
        results: &rounded,
    };

    let json = serde_json::to_string_pretty(&payload)?;
    std::fs::write(path, json).map_err(|source| CrawlerError::ResultFile {
        path: path.to_path_buf(),
        source,
    })?;

    log::info!("saved {} results to {}", rounded.len(), path.display());
    Ok(())
}
