//! A polite, resource-aware headless-browser crawler core.
//!
//! Drives a headless Chromium instance over a batch of URLs under two
//! constraints: a per-domain politeness delay ([`scheduler`]) and a
//! system-resource admission gate ([`resource_monitor`]). Fetches run
//! through a restart-capable [`browser_supervisor`], and the whole pipeline
//! is hosted behind a small [`actor`] runtime so callers interact with it via
//! request/reply rather than a bag of shared state.

pub mod actor;
pub mod browser_setup;
pub mod browser_supervisor;
pub mod config;
pub mod crawler_actor;
pub mod error;
pub mod io;
pub mod orchestrator;
pub mod resource_monitor;
pub mod runtime;
pub mod scheduler;
pub mod stats;
pub mod types;

pub use browser_supervisor::{BrowserSupervisor, ChromiumFetcher, FetchOutcome, Fetcher};
pub use config::{CrawlerConfig, CrawlerConfigBuilder};
pub use crawler_actor::CrawlerActor;
pub use error::{CrawlerError, Result};
pub use resource_monitor::ResourceMonitor;
pub use scheduler::DomainScheduler;
pub use types::{CrawlResult, CrawlStatus, ResourceStats};
