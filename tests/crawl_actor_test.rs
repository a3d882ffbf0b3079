//! End-to-end scenarios against the public `CrawlerActor` API, using a mock
//! `Fetcher` in place of a live Chromium instance: a batch of URLs goes in,
//! a `CrawlResult` per URL comes out.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use crawler::actor::Actor;
use crawler::{CrawlResult, CrawlStatus, CrawlerActor, CrawlerConfigBuilder, FetchOutcome, Fetcher};

struct ScriptedFetcher {
    calls: AtomicUsize,
    fail_first_n: usize,
    restarts: AtomicU32,
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn ensure_ready(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn fetch_one(&self, url: &str, _timeout: Duration) -> FetchOutcome {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_first_n {
            FetchOutcome::Failed {
                error: "simulated fetch error".to_string(),
            }
        } else {
            FetchOutcome::Success {
                initial_html_bytes: 100,
                rendered_html_bytes: url.len() as u64 * 10,
            }
        }
    }

    async fn restart(&self) -> anyhow::Result<()> {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn shutdown(&self) {}
}

/// A batch of URLs across distinct domains all complete successfully.
#[tokio::test]
async fn all_urls_complete_through_the_actor() {
    let cfg = CrawlerConfigBuilder::new().domain_delay_sec(0.0).build();
    let fetcher = ScriptedFetcher {
        calls: AtomicUsize::new(0),
        fail_first_n: 0,
        restarts: AtomicU32::new(0),
    };
    let actor_ref = CrawlerActor::new(cfg, fetcher).spawn();

    let urls: Vec<String> = (0..6).map(|i| format!("https://host{i}.example/page")).collect();
    let results = actor_ref.call(urls.clone()).await.expect("call succeeds");

    assert_eq!(results.len(), urls.len());
    assert!(results.iter().all(|r| r.status == CrawlStatus::Success));

    let mut actor_ref = actor_ref;
    actor_ref.cancel();
    actor_ref.join().await;
}

/// Two domains interleave freely, each respecting its own cooldown
/// independent of the other.
#[tokio::test]
async fn two_domains_interleave_under_cooldown() {
    let cfg = CrawlerConfigBuilder::new().domain_delay_sec(0.05).build();
    let fetcher = ScriptedFetcher {
        calls: AtomicUsize::new(0),
        fail_first_n: 0,
        restarts: AtomicU32::new(0),
    };
    let actor_ref = CrawlerActor::new(cfg, fetcher).spawn();

    let urls = vec![
        "https://a.example/1".to_string(),
        "https://b.example/1".to_string(),
        "https://a.example/2".to_string(),
        "https://b.example/2".to_string(),
    ];
    let results = actor_ref.call(urls).await.expect("call succeeds");
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.status == CrawlStatus::Success));

    let mut actor_ref = actor_ref;
    actor_ref.cancel();
    actor_ref.join().await;
}

/// Repeated non-transient failures trigger exactly one engine restart at
/// the configured threshold, and subsequent fetches succeed.
#[tokio::test]
async fn repeated_failures_trigger_restart_then_recover() {
    let cfg = CrawlerConfigBuilder::new()
        .domain_delay_sec(0.0)
        .max_failures(2)
        .build();
    let fetcher = ScriptedFetcher {
        calls: AtomicUsize::new(0),
        fail_first_n: 2,
        restarts: AtomicU32::new(0),
    };
    let actor_ref = CrawlerActor::new(cfg, fetcher).spawn();

    let urls = vec![
        "https://flaky.example/1".to_string(),
        "https://flaky.example/2".to_string(),
        "https://flaky.example/3".to_string(),
    ];
    let results = actor_ref.call(urls).await.expect("call succeeds");

    assert_eq!(results.len(), 3);
    let statuses: Vec<CrawlStatus> = results.iter().map(|r| r.status).collect();
    assert_eq!(statuses.iter().filter(|s| **s == CrawlStatus::Failed).count(), 2);
    assert_eq!(statuses.iter().filter(|s| **s == CrawlStatus::Success).count(), 1);

    let mut actor_ref = actor_ref;
    actor_ref.cancel();
    actor_ref.join().await;
}

/// Empty batches resolve immediately with no results.
#[tokio::test]
async fn empty_batch_resolves_with_no_results() {
    let cfg = CrawlerConfigBuilder::new().build();
    let fetcher = ScriptedFetcher {
        calls: AtomicUsize::new(0),
        fail_first_n: 0,
        restarts: AtomicU32::new(0),
    };
    let actor_ref = CrawlerActor::new(cfg, fetcher).spawn();

    let results: Vec<CrawlResult> = actor_ref.call(Vec::new()).await.expect("call succeeds");
    assert!(results.is_empty());

    let mut actor_ref = actor_ref;
    actor_ref.cancel();
    actor_ref.join().await;
}
