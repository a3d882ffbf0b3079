//! Browser supervisor: lazy engine handle, isolated per-URL fetch, and
//! restart-on-repeat-failure.
//!
//! The sequence per fetch is: lock, ensure the engine is up, open a fresh
//! browser context and a page within it, navigate, wait for network-idle
//! quiescence, then read the rendered HTML — all under one timeout budget —
//! always closing the page and disposing the context. Failures are
//! classified transient/non-transient; non-transient failures count toward a
//! threshold that triggers an engine restart. The restart/failure counting
//! policy is generic over a `Fetcher` seam (`BrowserSupervisor<F: Fetcher>`)
//! so it runs identically against the real chromiumoxide backend and a
//! deterministic test double.

use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent, EventResponseReceived,
};
use chromiumoxide::cdp::browser_protocol::target::CreateBrowserContextParams;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::browser_setup::launch_browser;
use crate::config::CrawlerConfig;
use crate::error::CrawlerError;
use crate::types::CrawlResult;

/// How long the in-flight request count must stay at zero before the page is
/// considered network-idle.
const IDLE_QUIESCENCE_WINDOW: Duration = Duration::from_millis(500);
/// Poll interval while waiting for network-idle.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Fallback fixed wait used when the Network domain's event stream can't be
/// subscribed to at all, so idle can't be measured directly.
const IDLE_FALLBACK_WAIT: Duration = Duration::from_millis(500);

/// Outcome of one low-level, isolated-context fetch attempt.
pub enum FetchOutcome {
    Success {
        initial_html_bytes: u64,
        rendered_html_bytes: u64,
    },
    Timeout {
        initial_html_bytes: u64,
        rendered_html_bytes: u64,
        error: String,
    },
    Failed {
        error: String,
    },
}

/// Seam between the restart/failure-counting policy (generic, testable) and
/// the concrete engine driving it.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Launch the engine if it isn't already running. Called before every
    /// fetch; a no-op once the engine is up.
    async fn ensure_ready(&self) -> anyhow::Result<()>;

    /// Fetch `url` in a fresh isolated browser context, bounded by `timeout`
    /// for navigation followed by a network-idle quiescence wait.
    async fn fetch_one(&self, url: &str, timeout: Duration) -> FetchOutcome;

    /// Tear down and relaunch the engine.
    async fn restart(&self) -> anyhow::Result<()>;

    /// Final shutdown, called once when the supervisor is dropped from use.
    async fn shutdown(&self);
}

/// Wraps a [`Fetcher`] with the failure-count-driven restart policy.
pub struct BrowserSupervisor<F: Fetcher> {
    fetcher: F,
    cfg: CrawlerConfig,
    n_failures: AtomicU32,
    restart_lock: Mutex<()>,
}

impl<F: Fetcher> BrowserSupervisor<F> {
    pub fn new(fetcher: F, cfg: CrawlerConfig) -> Self {
        Self {
            fetcher,
            cfg,
            n_failures: AtomicU32::new(0),
            restart_lock: Mutex::new(()),
        }
    }

    /// Fetch a single URL, producing a finished `CrawlResult`. Never panics;
    /// every failure mode (engine-launch, navigation, timeout) is captured
    /// as a result variant.
    #[tracing::instrument(skip(self), fields(url))]
    pub async fn fetch(&self, url: &str) -> CrawlResult {
        let t0 = Instant::now();

        if let Err(e) = self.fetcher.ensure_ready().await {
            let msg = e.to_string();
            self.on_failure(&msg).await;
            return CrawlResult::failed(url.to_string(), msg, t0.elapsed().as_secs_f64());
        }

        let timeout = Duration::from_secs_f64(self.cfg.page_timeout_sec());
        let outcome = self.fetcher.fetch_one(url, timeout).await;
        let elapsed = t0.elapsed().as_secs_f64();

        match outcome {
            FetchOutcome::Success {
                initial_html_bytes,
                rendered_html_bytes,
            } => {
                self.n_failures.store(0, Ordering::SeqCst);
                CrawlResult::success(url.to_string(), initial_html_bytes, rendered_html_bytes, elapsed)
            }
            FetchOutcome::Timeout {
                initial_html_bytes,
                rendered_html_bytes,
                error,
            } => CrawlResult::timeout(url.to_string(), initial_html_bytes, rendered_html_bytes, error, elapsed),
            FetchOutcome::Failed { error } => {
                self.on_failure(&error).await;
                CrawlResult::failed(url.to_string(), error, elapsed)
            }
        }
    }

    /// Classify `err_msg` as transient or not; non-transient failures count
    /// toward `max_failures`, at which point the engine is reset and
    /// relaunched.
    async fn on_failure(&self, err_msg: &str) {
        let lower = err_msg.to_lowercase();
        let transient = lower.contains("browser has been closed") || lower.contains("context");
        if transient {
            return;
        }

        let n = self.n_failures.fetch_add(1, Ordering::SeqCst) + 1;
        if n >= self.cfg.max_failures() {
            let _guard = self.restart_lock.lock().await;
            // Re-check: another task may have already restarted while we
            // waited for the lock.
            if self.n_failures.load(Ordering::SeqCst) >= self.cfg.max_failures() {
                self.n_failures.store(0, Ordering::SeqCst);
                tracing::info!(max_failures = self.cfg.max_failures(), "restarting engine");
                if let Err(e) = self.fetcher.restart().await {
                    log::error!("engine restart failed: {e}");
                }
            }
        }
    }

    /// Shut down the underlying engine. Call once at orchestrator exit.
    pub async fn shutdown(&self) {
        self.fetcher.shutdown().await;
    }
}

struct EngineState {
    browser: Option<Arc<Browser>>,
    handler_task: Option<JoinHandle<()>>,
}

/// `Fetcher` backed by a real `chromiumoxide` Chromium instance.
pub struct ChromiumFetcher {
    headless: bool,
    state: Mutex<EngineState>,
}

impl ChromiumFetcher {
    #[must_use]
    pub fn new(headless: bool) -> Self {
        Self {
            headless,
            state: Mutex::new(EngineState {
                browser: None,
                handler_task: None,
            }),
        }
    }

    async fn teardown_locked(state: &mut EngineState) {
        if let Some(browser) = state.browser.take() {
            drop(browser);
        }
        if let Some(task) = state.handler_task.take() {
            task.abort();
        }
    }
}

/// Poll `in_flight` until it has held at zero for a full quiescence window.
/// Has no timeout of its own — the caller wraps this in the shared
/// navigation+idle-wait budget.
async fn wait_for_network_idle(in_flight: &AtomicI64) {
    let mut quiet_since = if in_flight.load(Ordering::SeqCst) <= 0 {
        Some(Instant::now())
    } else {
        None
    };
    loop {
        tokio::time::sleep(IDLE_POLL_INTERVAL).await;
        if in_flight.load(Ordering::SeqCst) <= 0 {
            let since = quiet_since.get_or_insert_with(Instant::now);
            if since.elapsed() >= IDLE_QUIESCENCE_WINDOW {
                return;
            }
        } else {
            quiet_since = None;
        }
    }
}

#[async_trait]
impl Fetcher for ChromiumFetcher {
    async fn ensure_ready(&self) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        if state.browser.is_some() {
            return Ok(());
        }
        let (browser, handler_task, _user_data_dir) = launch_browser(self.headless, None).await?;
        state.browser = Some(Arc::new(browser));
        state.handler_task = Some(handler_task);
        Ok(())
    }

    async fn fetch_one(&self, url: &str, timeout: Duration) -> FetchOutcome {
        let browser = {
            let state = self.state.lock().await;
            // Cloning the Arc (not the lock) lets context/page creation and
            // navigation run without holding `state` — only `ensure_ready`
            // and `restart` need exclusive access to the engine slot.
            match state.browser.as_ref() {
                Some(b) => Arc::clone(b),
                None => {
                    return FetchOutcome::Failed {
                        error: "browser has been closed".to_string(),
                    };
                }
            }
        };

        // A fresh context per fetch keeps cookies, cache and storage from
        // leaking between concurrent fetches of unrelated URLs.
        let context = match browser.new_context(CreateBrowserContextParams::default()).await {
            Ok(c) => c,
            Err(e) => {
                let err = CrawlerError::ContextCreation(e.to_string());
                return FetchOutcome::Failed { error: err.to_string() };
            }
        };

        let page = match context.new_page(url).await {
            Ok(p) => p,
            Err(e) => {
                let _ = context.dispose().await;
                return FetchOutcome::Failed { error: e.to_string() };
            }
        };

        let initial_bytes = Arc::new(AtomicU64::new(0));
        let initial_bytes_writer = initial_bytes.clone();
        let response_observer: JoinHandle<()> = match page.event_listener::<EventResponseReceived>().await {
            Ok(mut events) => tokio::spawn(async move {
                use tokio_stream::StreamExt;
                while let Some(ev) = events.next().await {
                    let mime = ev.response.mime_type.to_lowercase();
                    if !mime.contains("html") {
                        continue;
                    }
                    // `Headers` only guarantees (de)serializability, not a
                    // stable field layout, so go through JSON rather than
                    // assume an accessor method.
                    if let Ok(serde_json::Value::Object(headers)) =
                        serde_json::to_value(&ev.response.headers)
                    {
                        let content_length = headers
                            .iter()
                            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                            .and_then(|(_, v)| v.as_str().and_then(|s| s.parse::<u64>().ok()));
                        if let Some(n) = content_length {
                            initial_bytes_writer.store(n, Ordering::SeqCst);
                        }
                    }
                    break;
                }
            }),
            Err(_) => tokio::spawn(async {}),
        };

        // In-flight request counter driven by the Network domain's own
        // request-lifecycle events, used below to detect network-idle.
        let in_flight = Arc::new(AtomicI64::new(0));
        let mut idle_trackable = true;

        let started_listener = {
            let in_flight = in_flight.clone();
            match page.event_listener::<EventRequestWillBeSent>().await {
                Ok(mut events) => Some(tokio::spawn(async move {
                    use tokio_stream::StreamExt;
                    while events.next().await.is_some() {
                        in_flight.fetch_add(1, Ordering::SeqCst);
                    }
                })),
                Err(_) => {
                    idle_trackable = false;
                    None
                }
            }
        };
        let finished_listener = {
            let in_flight = in_flight.clone();
            match page.event_listener::<EventLoadingFinished>().await {
                Ok(mut events) => Some(tokio::spawn(async move {
                    use tokio_stream::StreamExt;
                    while events.next().await.is_some() {
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                    }
                })),
                Err(_) => {
                    idle_trackable = false;
                    None
                }
            }
        };
        let failed_listener = {
            let in_flight = in_flight.clone();
            match page.event_listener::<EventLoadingFailed>().await {
                Ok(mut events) => Some(tokio::spawn(async move {
                    use tokio_stream::StreamExt;
                    while events.next().await.is_some() {
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                    }
                })),
                Err(_) => {
                    idle_trackable = false;
                    None
                }
            }
        };

        let fetch_result = tokio::time::timeout(timeout, async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            if idle_trackable {
                wait_for_network_idle(&in_flight).await;
            } else {
                tokio::time::sleep(IDLE_FALLBACK_WAIT).await;
            }
            page.content().await
        })
        .await;

        response_observer.abort();
        if let Some(h) = started_listener {
            h.abort();
        }
        if let Some(h) = finished_listener {
            h.abort();
        }
        if let Some(h) = failed_listener {
            h.abort();
        }
        let initial_html_bytes = initial_bytes.load(Ordering::SeqCst);

        let outcome = match fetch_result {
            Ok(Ok(html)) => FetchOutcome::Success {
                initial_html_bytes,
                rendered_html_bytes: html.len() as u64,
            },
            Ok(Err(e)) => FetchOutcome::Failed { error: e.to_string() },
            Err(_) => {
                let rendered = page.content().await.unwrap_or_default();
                FetchOutcome::Timeout {
                    initial_html_bytes,
                    rendered_html_bytes: rendered.len() as u64,
                    error: format!("navigation timed out after {timeout:?}"),
                }
            }
        };

        let _ = page.close().await;
        let _ = context.dispose().await;
        outcome
    }

    async fn restart(&self) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        Self::teardown_locked(&mut state).await;
        let (browser, handler_task, _user_data_dir) = launch_browser(self.headless, None).await?;
        state.browser = Some(Arc::new(browser));
        state.handler_task = Some(handler_task);
        Ok(())
    }

    async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        Self::teardown_locked(&mut state).await;
    }
}
