//! Error types for the crawler's component boundaries.
//!
//! Per-URL failures never cross a component boundary as an exception — they
//! become a `CrawlResult` with `CrawlStatus::Failed`/`Timeout`. `CrawlerError`
//! is reserved for failures that abort an operation outright: an engine that
//! cannot be launched, a URL file that cannot be read.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CrawlerError>;

#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("failed to launch browser engine: {0}")]
    EngineLaunch(String),

    #[error("failed to create browser context: {0}")]
    ContextCreation(String),

    #[error("failed to read URL file {path}: {source}")]
    UrlFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write result file {path}: {source}")]
    ResultFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("actor call failed: {0}")]
    ActorCall(String),
}
