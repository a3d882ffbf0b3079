//! Getter methods for `CrawlerConfig`

use std::path::Path;

use super::types::CrawlerConfig;

impl CrawlerConfig {
    #[must_use]
    pub fn domain_delay_sec(&self) -> f64 {
        self.domain_delay_sec
    }

    #[must_use]
    pub fn page_timeout_sec(&self) -> f64 {
        self.page_timeout_sec
    }

    #[must_use]
    pub fn cpu_threshold(&self) -> f64 {
        self.cpu_threshold
    }

    #[must_use]
    pub fn mem_threshold(&self) -> f64 {
        self.mem_threshold
    }

    #[must_use]
    pub fn min_mem_avail_mb(&self) -> f64 {
        self.min_mem_avail_mb
    }

    #[must_use]
    pub fn max_failures(&self) -> u32 {
        self.max_failures
    }

    #[must_use]
    pub fn result_path(&self) -> &Path {
        &self.result_path
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }
}
