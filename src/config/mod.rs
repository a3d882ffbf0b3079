//! Crawler configuration
//!
//! Provides `CrawlerConfig` and its builder, following the same
//! struct/builder/getters split used throughout this crate's other
//! configuration surfaces.

pub mod builder;
pub mod getters;
pub mod types;

pub use builder::CrawlerConfigBuilder;
pub use types::CrawlerConfig;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_crawler() {
        let cfg = CrawlerConfig::default();
        assert_eq!(cfg.domain_delay_sec(), 60.0);
        assert_eq!(cfg.page_timeout_sec(), 60.0);
        assert_eq!(cfg.cpu_threshold(), 80.0);
        assert_eq!(cfg.mem_threshold(), 80.0);
        assert_eq!(cfg.min_mem_avail_mb(), 512.0);
        assert_eq!(cfg.max_failures(), 3);
        assert!(cfg.headless());
    }

    #[test]
    fn builder_clamps_negative_delay() {
        let cfg = CrawlerConfigBuilder::new().domain_delay_sec(-5.0).build();
        assert_eq!(cfg.domain_delay_sec(), 0.0);
    }

    #[test]
    fn builder_clamps_threshold_range() {
        let cfg = CrawlerConfigBuilder::new().cpu_threshold(150.0).build();
        assert_eq!(cfg.cpu_threshold(), 100.0);
    }

    #[test]
    fn builder_overrides_apply() {
        let cfg = CrawlerConfigBuilder::new()
            .domain_delay_sec(2.0)
            .page_timeout_sec(5.0)
            .max_failures(5)
            .build();
        assert_eq!(cfg.domain_delay_sec(), 2.0);
        assert_eq!(cfg.page_timeout_sec(), 5.0);
        assert_eq!(cfg.max_failures(), 5);
    }
}
