//! Driving loop: reap completed fetches, admission-gate new dispatches, pace
//! the tick.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};

use crate::browser_supervisor::{BrowserSupervisor, Fetcher};
use crate::resource_monitor::Admission;
use crate::scheduler::DomainScheduler;
use crate::types::CrawlResult;

const PACE_ACTIVE: Duration = Duration::from_millis(500);
const PACE_IDLE_CAP: Duration = Duration::from_secs(5);

/// Awaits a spawned fetch task and carries its dispatched URL alongside the
/// join result — a `JoinError` on its own can't tell the caller which
/// domain's in-flight slot needs releasing, since the URL was moved into the
/// spawned future.
async fn join_with_url(
    url: String,
    handle: tokio::task::JoinHandle<CrawlResult>,
) -> (String, Result<CrawlResult, tokio::task::JoinError>) {
    let result = handle.await;
    (url, result)
}

/// Run the crawl loop over `urls` to completion, returning every result in
/// completion order. Tears down the browser supervisor on exit, including
/// when the loop is left via an early return.
pub async fn run<F: Fetcher + 'static, M: Admission>(
    urls: Vec<String>,
    scheduler: &mut DomainScheduler,
    monitor: &mut M,
    supervisor: Arc<BrowserSupervisor<F>>,
) -> Vec<CrawlResult> {
    scheduler.add_urls(urls);

    let mut results = Vec::new();
    let mut active = FuturesUnordered::new();

    while scheduler.n_pending() > 0 || !active.is_empty() {
        while let Some(Some((url, joined))) = active.next().now_or_never() {
            let result = match joined {
                Ok(result) => result,
                Err(join_err) => {
                    log::error!("fetch task failed for {url}: {join_err}");
                    // Synthetic failure, keyed by the URL that was actually
                    // dispatched, so the domain's in-flight slot is always
                    // released — a join failure must not deadlock the
                    // scheduler.
                    CrawlResult::failed(url, join_err.to_string(), 0.0)
                }
            };
            scheduler.mark_done(&result.url);
            results.push(result);
        }

        if monitor.admit(scheduler.n_in_flight()) {
            let ready = scheduler.get_ready_urls();
            if !ready.is_empty() {
                log::info!(
                    "[concurrency] launching {} new tasks, in_flight={}",
                    ready.len(),
                    scheduler.n_in_flight()
                );
            }
            for url in ready {
                let supervisor = Arc::clone(&supervisor);
                let url_for_task = url.clone();
                let handle = tokio::spawn(async move { supervisor.fetch(&url_for_task).await });
                active.push(join_with_url(url, handle));
            }
        }

        if !active.is_empty() {
            tokio::time::sleep(PACE_ACTIVE).await;
        } else {
            let wait = Duration::from_secs_f64(scheduler.next_available_sec()).min(PACE_IDLE_CAP);
            if !wait.is_zero() {
                log::info!("waiting {:.1}s for next domain...", wait.as_secs_f64());
                tokio::time::sleep(wait).await;
            }
        }
    }

    supervisor.shutdown().await;
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser_supervisor::FetchOutcome;
    use crate::config::CrawlerConfig;
    use crate::resource_monitor::ResourceMonitor;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct InstantFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for InstantFetcher {
        async fn ensure_ready(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn fetch_one(&self, url: &str, _timeout: Duration) -> FetchOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            FetchOutcome::Success {
                initial_html_bytes: 1,
                rendered_html_bytes: url.len() as u64,
            }
        }

        async fn restart(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn shutdown(&self) {}
    }

    #[tokio::test]
    async fn runs_every_url_to_completion() {
        let cfg = CrawlerConfig::default();
        let mut scheduler = DomainScheduler::new(0.0);
        let mut monitor = ResourceMonitor::new(cfg.clone());
        let supervisor = Arc::new(BrowserSupervisor::new(
            InstantFetcher {
                calls: AtomicUsize::new(0),
            },
            cfg,
        ));

        let urls = vec![
            "https://a.com/1".to_string(),
            "https://b.com/1".to_string(),
            "https://a.com/2".to_string(),
        ];

        let results = run(urls, &mut scheduler, &mut monitor, supervisor).await;
        assert_eq!(results.len(), 3);
        assert_eq!(scheduler.n_pending(), 0);
        assert_eq!(scheduler.n_in_flight(), 0);
    }

    /// Admission denied for the first few polls, then opened — all URLs
    /// should still complete once it opens.
    struct FlakyAdmission {
        denials_left: usize,
    }

    impl Admission for FlakyAdmission {
        fn admit(&mut self, _current_tabs: usize) -> bool {
            if self.denials_left > 0 {
                self.denials_left -= 1;
                false
            } else {
                true
            }
        }
    }

    #[tokio::test]
    async fn admission_denial_throttles_then_releases() {
        let cfg = CrawlerConfig::default();
        let mut scheduler = DomainScheduler::new(0.0);
        let mut monitor = FlakyAdmission { denials_left: 3 };
        let supervisor = Arc::new(BrowserSupervisor::new(
            InstantFetcher {
                calls: AtomicUsize::new(0),
            },
            cfg,
        ));

        let urls: Vec<String> = (0..5).map(|i| format!("https://d{i}.com/1")).collect();
        let results = run(urls, &mut scheduler, &mut monitor, supervisor).await;
        assert_eq!(results.len(), 5);
    }

    /// A fetcher whose task panics for one domain. The panicking domain's
    /// in-flight slot must still be released (keyed by the real dispatched
    /// URL, not a placeholder) so the loop doesn't deadlock and the other
    /// domain still completes.
    struct PanicsForOneDomain;

    #[async_trait]
    impl Fetcher for PanicsForOneDomain {
        async fn ensure_ready(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn fetch_one(&self, url: &str, _timeout: Duration) -> FetchOutcome {
            if url.contains("panics.com") {
                panic!("simulated task crash");
            }
            FetchOutcome::Success {
                initial_html_bytes: 1,
                rendered_html_bytes: url.len() as u64,
            }
        }

        async fn restart(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn shutdown(&self) {}
    }

    #[tokio::test]
    async fn panicking_fetch_task_releases_its_own_domain_not_a_placeholder() {
        let cfg = CrawlerConfig::default();
        let mut scheduler = DomainScheduler::new(0.0);
        let mut monitor = ResourceMonitor::new(cfg.clone());
        let supervisor = Arc::new(BrowserSupervisor::new(PanicsForOneDomain, cfg));

        let urls = vec![
            "https://panics.com/1".to_string(),
            "https://ok.com/1".to_string(),
        ];

        let results = run(urls, &mut scheduler, &mut monitor, supervisor).await;
        assert_eq!(results.len(), 2);

        let panicked = results
            .iter()
            .find(|r| r.url.contains("panics.com"))
            .expect("panicking URL carries its own result, not a placeholder");
        assert_eq!(panicked.status, crate::types::CrawlStatus::Failed);

        let ok = results.iter().find(|r| r.url.contains("ok.com")).unwrap();
        assert_eq!(ok.status, crate::types::CrawlStatus::Success);

        // Both domains' in-flight slots were released — nothing left
        // outstanding and nothing left pending.
        assert_eq!(scheduler.n_in_flight(), 0);
        assert_eq!(scheduler.n_pending(), 0);
    }
}
