//! CLI entry point: `crawler [N=5] [url_file]`.
//!
//! Loads a batch of URLs, runs them through the crawl actor, writes the
//! result JSON, and prints a summary.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use crawler::actor::Actor;
use crawler::{CrawlerActor, CrawlerConfigBuilder};

const DEFAULT_URL_FILE: &str = "urls.txt";
const DEFAULT_N_URLS: usize = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let n_urls: usize = args
        .next()
        .map(|s| s.parse())
        .transpose()
        .context("N must be an integer")?
        .unwrap_or(DEFAULT_N_URLS);
    let url_file = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_URL_FILE));

    let cfg = CrawlerConfigBuilder::new().build();
    let urls = crawler::io::load_urls(&url_file, Some(n_urls))?;

    let fetcher = crawler::ChromiumFetcher::new(cfg.headless());
    let actor_ref = CrawlerActor::new(cfg.clone(), fetcher).spawn();

    let t0 = Instant::now();
    let results = actor_ref
        .call(urls)
        .await
        .map_err(|e| anyhow::anyhow!("crawl actor failed: {e}"))?;
    let wall_clock_sec = t0.elapsed().as_secs_f64();

    let mut actor_ref = actor_ref;
    actor_ref.cancel();
    actor_ref.join().await;

    crawler::io::save_results(&results, cfg.result_path(), wall_clock_sec)?;
    crawler::stats::print_stats(&results);

    Ok(())
}
