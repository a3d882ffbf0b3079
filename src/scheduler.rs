//! Per-domain FIFO scheduling with politeness cooldowns.
//!
//! Timing is `Instant`-based (see [`DomainState::last_crawl`]). A plain
//! `HashMap`/`VecDeque` is enough here — only the orchestrator's own task
//! ever touches the scheduler, so there's no concurrent-access case to
//! design around.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

use url::Url;

/// Extracts the authority component of a URL, falling back to the raw
/// string if it cannot be parsed as a URL.
#[must_use]
pub fn extract_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

struct DomainState {
    last_crawl: Option<Instant>,
    pending: VecDeque<String>,
}

impl DomainState {
    fn new() -> Self {
        Self {
            last_crawl: None,
            pending: VecDeque::new(),
        }
    }

    fn elapsed_since_crawl(&self) -> Duration {
        match self.last_crawl {
            Some(t) => t.elapsed(),
            None => Duration::MAX,
        }
    }
}

/// Per-domain FIFO queues with cooldown gating and in-flight exclusion.
///
/// Domain insertion order is preserved (backed by a `Vec` of keys alongside
/// the map) so that `get_ready_urls` sweeps deterministically within a tick.
/// Callers may depend on stable ordering within one call but not across
/// calls.
pub struct DomainScheduler {
    domain_delay: Duration,
    order: Vec<String>,
    domains: HashMap<String, DomainState>,
    in_flight: HashSet<String>,
}

impl DomainScheduler {
    #[must_use]
    pub fn new(domain_delay_sec: f64) -> Self {
        Self {
            domain_delay: Duration::from_secs_f64(domain_delay_sec.max(0.0)),
            order: Vec::new(),
            domains: HashMap::new(),
            in_flight: HashSet::new(),
        }
    }

    /// Bucket each URL by domain and append to that domain's queue, in
    /// the order given. No deduplication.
    pub fn add_urls(&mut self, urls: impl IntoIterator<Item = String>) {
        let mut n = 0usize;
        for url in urls {
            let domain = extract_domain(&url);
            if !self.domains.contains_key(&domain) {
                self.order.push(domain.clone());
                self.domains.insert(domain.clone(), DomainState::new());
            }
            let state = self
                .domains
                .get_mut(&domain)
                .expect("domain was just inserted");
            state.pending.push_back(url);
            n += 1;
        }
        log::info!(
            "added {n} urls across {} domains",
            self.domains.len()
        );
    }

    /// Deterministic sweep over domains in insertion order: for each domain
    /// with a non-empty queue, not in-flight, and past its cooldown, pop the
    /// head URL and mark the domain in-flight. At most one URL per domain
    /// per call.
    pub fn get_ready_urls(&mut self) -> Vec<String> {
        let mut ready = Vec::new();
        for domain in &self.order {
            if self.in_flight.contains(domain) {
                continue;
            }
            let Some(state) = self.domains.get_mut(domain) else {
                continue;
            };
            if state.pending.is_empty() {
                continue;
            }
            if state.elapsed_since_crawl() < self.domain_delay {
                continue;
            }
            if let Some(url) = state.pending.pop_front() {
                self.in_flight.insert(domain.clone());
                ready.push(url);
            }
        }
        ready
    }

    /// Remove the URL's domain from in-flight and start its cooldown from
    /// now. A no-op for an unknown domain.
    pub fn mark_done(&mut self, url: &str) {
        let domain = extract_domain(url);
        self.in_flight.remove(&domain);
        if let Some(state) = self.domains.get_mut(&domain) {
            state.last_crawl = Some(Instant::now());
        }
    }

    /// Sum of queue lengths across all domains.
    #[must_use]
    pub fn n_pending(&self) -> usize {
        self.domains.values().map(|s| s.pending.len()).sum()
    }

    /// Number of domains currently in flight.
    #[must_use]
    pub fn n_in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Minimum wait, over domains with a non-empty queue that are not
    /// in-flight, until that domain clears its cooldown. Zero if none are
    /// eligible (all in-flight, or all queues empty).
    #[must_use]
    pub fn next_available_sec(&self) -> f64 {
        let mut min_wait: Option<Duration> = None;
        for (domain, state) in &self.domains {
            if state.pending.is_empty() || self.in_flight.contains(domain) {
                continue;
            }
            let elapsed = state.elapsed_since_crawl();
            let wait = self.domain_delay.saturating_sub(elapsed);
            min_wait = Some(match min_wait {
                Some(w) => w.min(wait),
                None => wait,
            });
        }
        min_wait.map_or(0.0, |w| w.as_secs_f64())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_urls() -> impl Strategy<Value = Vec<String>> {
        proptest::collection::vec(0u8..6, 0..40)
            .prop_map(|domains| domains.into_iter().map(|d| format!("https://d{d}.com/p")).collect())
    }

    proptest! {
        /// At most one URL per domain is returned per `get_ready_urls` call.
        #[test]
        fn at_most_one_per_domain_per_call(urls in arb_urls()) {
            let mut sched = DomainScheduler::new(0.0);
            sched.add_urls(urls);
            let ready = sched.get_ready_urls();
            let mut seen = HashSet::new();
            for url in &ready {
                let domain = extract_domain(url);
                prop_assert!(seen.insert(domain));
            }
        }

        /// Every call to `get_ready_urls` dispatches no more than the number
        /// of URLs still pending, and never dispatches more than were added.
        #[test]
        fn total_dispatched_never_exceeds_total_added(urls in arb_urls()) {
            let total = urls.len();
            let mut sched = DomainScheduler::new(0.0);
            sched.add_urls(urls);

            let mut dispatched = 0usize;
            loop {
                let ready = sched.get_ready_urls();
                if ready.is_empty() {
                    break;
                }
                dispatched += ready.len();
                for url in &ready {
                    sched.mark_done(url);
                }
            }
            prop_assert!(dispatched <= total);
            prop_assert_eq!(sched.n_pending(), 0);
        }

        /// `n_in_flight` never exceeds the number of distinct domains seen.
        #[test]
        fn in_flight_never_exceeds_distinct_domains(urls in arb_urls()) {
            let mut sched = DomainScheduler::new(60.0);
            let n_domains: HashSet<String> = urls.iter().map(|u| extract_domain(u)).collect();
            sched.add_urls(urls);
            let _ready = sched.get_ready_urls();
            prop_assert!(sched.n_in_flight() <= n_domains.len());
        }

        /// `n_pending` is non-increasing across successive `get_ready_urls`
        /// calls, and decreases by exactly the number dispatched.
        #[test]
        fn n_pending_decreases_by_exactly_dispatched(urls in arb_urls()) {
            let mut sched = DomainScheduler::new(0.0);
            sched.add_urls(urls);

            let before = sched.n_pending();
            let ready = sched.get_ready_urls();
            let after = sched.n_pending();
            prop_assert_eq!(before - after, ready.len());
        }
    }
}
