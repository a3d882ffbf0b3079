//! Hosts the crawl orchestrator behind the actor runtime.
//!
//! A single `Call` type carries the URL batch; no `Cast` messages are
//! defined. `before_exit` tears down the browser supervisor regardless of
//! how the run ended.

use std::sync::Arc;

use async_trait::async_trait;

use crate::actor::Actor;
use crate::browser_supervisor::{BrowserSupervisor, Fetcher};
use crate::config::CrawlerConfig;
use crate::resource_monitor::ResourceMonitor;
use crate::scheduler::DomainScheduler;
use crate::types::CrawlResult;

/// No fire-and-forget messages are defined for this actor.
pub enum NoCast {}

pub struct CrawlerActor<F: Fetcher + 'static> {
    scheduler: DomainScheduler,
    monitor: ResourceMonitor,
    supervisor: Arc<BrowserSupervisor<F>>,
}

impl<F: Fetcher + 'static> CrawlerActor<F> {
    #[must_use]
    pub fn new(cfg: CrawlerConfig, fetcher: F) -> Self {
        Self {
            scheduler: DomainScheduler::new(cfg.domain_delay_sec()),
            monitor: ResourceMonitor::new(cfg.clone()),
            supervisor: Arc::new(BrowserSupervisor::new(fetcher, cfg)),
        }
    }
}

#[async_trait]
impl<F: Fetcher + 'static> Actor for CrawlerActor<F> {
    type Call = Vec<String>;
    type Cast = NoCast;
    type Reply = Vec<CrawlResult>;
    type Error = String;

    async fn handle_cast(&mut self, msg: Self::Cast) -> Result<(), Self::Error> {
        match msg {}
    }

    async fn handle_call(&mut self, urls: Self::Call) -> Result<Self::Reply, Self::Error> {
        Ok(crate::orchestrator::run(
            urls,
            &mut self.scheduler,
            &mut self.monitor,
            Arc::clone(&self.supervisor),
        )
        .await)
    }

    async fn before_exit(&mut self, err: Option<Self::Error>) -> Option<Self::Error> {
        self.supervisor.shutdown().await;
        err
    }
}
