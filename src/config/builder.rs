//! Fluent builder for `CrawlerConfig`
//!
//! Every setter clamps out-of-range input rather than panicking or returning
//! a `Result` — a crawler misconfigured via a stray negative CLI flag should
//! still run, just with the nearest sane value, and say so in the log.

use super::types::CrawlerConfig;

#[derive(Debug, Clone, Default)]
pub struct CrawlerConfigBuilder {
    cfg: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cfg: CrawlerConfig::default(),
        }
    }

    #[must_use]
    pub fn domain_delay_sec(mut self, secs: f64) -> Self {
        self.cfg.domain_delay_sec = clamp_non_negative("domain_delay_sec", secs);
        self
    }

    #[must_use]
    pub fn page_timeout_sec(mut self, secs: f64) -> Self {
        self.cfg.page_timeout_sec = clamp_positive("page_timeout_sec", secs, 1.0);
        self
    }

    #[must_use]
    pub fn cpu_threshold(mut self, pct: f64) -> Self {
        self.cfg.cpu_threshold = clamp_percent("cpu_threshold", pct);
        self
    }

    #[must_use]
    pub fn mem_threshold(mut self, pct: f64) -> Self {
        self.cfg.mem_threshold = clamp_percent("mem_threshold", pct);
        self
    }

    #[must_use]
    pub fn min_mem_avail_mb(mut self, mb: f64) -> Self {
        self.cfg.min_mem_avail_mb = clamp_non_negative("min_mem_avail_mb", mb);
        self
    }

    #[must_use]
    pub fn max_failures(mut self, n: u32) -> Self {
        self.cfg.max_failures = n.max(1);
        self
    }

    #[must_use]
    pub fn result_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.cfg.result_path = path.into();
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.cfg.headless = headless;
        self
    }

    #[must_use]
    pub fn build(self) -> CrawlerConfig {
        self.cfg
    }
}

fn clamp_non_negative(field: &str, value: f64) -> f64 {
    if value < 0.0 {
        log::warn!("config: {field}={value} is negative, clamping to 0.0");
        0.0
    } else {
        value
    }
}

fn clamp_positive(field: &str, value: f64, floor: f64) -> f64 {
    if value < floor {
        log::warn!("config: {field}={value} below minimum {floor}, clamping");
        floor
    } else {
        value
    }
}

fn clamp_percent(field: &str, value: f64) -> f64 {
    if !(0.0..=100.0).contains(&value) {
        log::warn!("config: {field}={value} outside 0..=100, clamping");
        value.clamp(0.0, 100.0)
    } else {
        value
    }
}
