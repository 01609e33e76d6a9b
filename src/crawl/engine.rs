// src/crawl/engine.rs
// =============================================================================
// The traversal engine: one tokio task per (url, remaining depth).
//
// What a single traversal does:
// 1. Fast path: give up if depth is used up, the visited set looks full, or
//    the crawl was cancelled. The "looks full" read is lock-free and may be
//    stale; it only saves work.
// 2. Admission: ask the visited set to claim the URL. Membership, ceiling and
//    insert are checked under one lock, so every URL is fetched at most once
//    and the set never holds more than `max_visits` URLs. The ceiling is
//    exact, not approximate.
// 3. Fetch. A failure is logged and recorded, and this branch ends there.
// 4. Hand the already-fetched body to the download sink, if there is one.
// 5. Extract raw links, resolve each against the page URL, keep the ones the
//    allow-filter accepts. A link that fails to resolve is skipped alone.
// 6. Fan out: spawn a child traversal per accepted link at depth - 1.
//
// Every traversal is spawned on one `TaskTracker`. `Crawler::run` closes the
// tracker after spawning the seed and waits for it to empty. Children are
// spawned from inside running (tracked) tasks, so the tracker can't look
// empty while work is still pending.
//
// Two cancellation tokens are threaded through every task:
// - `shutdown` (external, e.g. Ctrl-C) aborts in-flight fetches too
// - `saturated` (set when the ceiling is hit) stops new spawns and tasks
//   still waiting for a fetch slot, but lets admitted fetches finish
//
// Rust concepts:
// - Arc<Engine>: every task holds a reference-counted handle to shared state
// - self: Arc<Self>: a method that consumes its own Arc, so the future is 'static
// - tokio::select!: race a fetch against cancellation
// - AtomicUsize: counters bumped from many tasks without a lock
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use bytes::Bytes;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use url::Url;

use super::filter::AllowFilter;
use super::report::{CrawlReport, FailedFetch};
use super::visited::{Admission, VisitedSet};
use crate::config::CrawlConfig;
use crate::error::FetchError;
use crate::extract::{self, ExtractorKind};
use crate::fetch::{Fetched, Fetcher};
use crate::resolve::resolve;
use crate::sink::{DownloadSink, SinkStats};

/// A configured crawl, ready to run once.
pub struct Crawler {
    start_url: Url,
    max_depth: u32,
    max_visits: usize,
    max_concurrency: Option<usize>,
    filter: AllowFilter,
    extractor: ExtractorKind,
    fetcher: Arc<dyn Fetcher>,
    sink: Option<DownloadSink>,
    shutdown: CancellationToken,
}

impl Crawler {
    pub fn new(config: &CrawlConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            start_url: config.start_url.clone(),
            max_depth: config.max_depth,
            max_visits: config.max_visits,
            max_concurrency: config.max_concurrency,
            filter: config.filter.clone(),
            extractor: config.extractor,
            fetcher,
            sink: None,
            shutdown: CancellationToken::new(),
        }
    }

    /// Saves every fetched text page through `sink`.
    pub fn with_sink(mut self, sink: DownloadSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Token that stops the crawl when cancelled, aborting in-flight fetches.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Crawls until every traversal has finished, then drains the download
    /// sink and reports.
    pub async fn run(self) -> CrawlReport {
        let started = Instant::now();
        let start_url = self.start_url.to_string();

        info!(
            start_url = %start_url,
            max_depth = self.max_depth,
            max_visits = self.max_visits,
            allow = self.filter.as_str(),
            "Starting crawl"
        );

        // Everything the tasks share lives in one Arc'd Engine
        let engine = Arc::new(Engine {
            fetcher: self.fetcher,
            visited: VisitedSet::new(self.max_visits),
            tasks: TaskTracker::new(),
            filter: self.filter,
            extractor: self.extractor,
            limiter: self.max_concurrency.map(Semaphore::new),
            sink: self.sink,
            shutdown: self.shutdown,
            saturated: CancellationToken::new(),
            stats: Stats::default(),
            failures: Mutex::new(Vec::new()),
        });

        // max_depth counts hops, so the seed itself needs one unit of depth
        engine.spawn_traversal(start_url.clone(), i64::from(self.max_depth) + 1);

        // Closing only means "wait() may finish once empty"; running tasks
        // can still spawn children onto the tracker
        engine.tasks.close();
        engine.tasks.wait().await;

        // Every traversal is done, so nothing else can submit to the sink
        let downloads = match &engine.sink {
            Some(sink) => Some(sink.shutdown().await),
            None => None,
        };

        let report = engine.report(start_url, downloads, started);
        info!(
            visited = report.visited_count,
            fetched = report.fetched,
            failed = report.failed.len(),
            "Crawl complete"
        );
        report
    }
}

// Per-crawl counters for the report
#[derive(Debug, Default)]
struct Stats {
    fetched: AtomicUsize,
    non_text: AtomicUsize,
    links_found: AtomicUsize,
    links_rejected: AtomicUsize,
    resolution_errors: AtomicUsize,
}

// State shared by every traversal task of one crawl
struct Engine {
    fetcher: Arc<dyn Fetcher>,
    visited: VisitedSet,
    tasks: TaskTracker,
    filter: AllowFilter,
    extractor: ExtractorKind,
    limiter: Option<Semaphore>,
    sink: Option<DownloadSink>,
    shutdown: CancellationToken,
    saturated: CancellationToken,
    stats: Stats,
    failures: Mutex<Vec<FailedFetch>>,
}

impl Engine {
    fn spawn_traversal(self: &Arc<Self>, url: String, remaining: i64) {
        // The tracker counts the task from this call until its future is
        // dropped: on return, on early exit, or while a panic unwinds
        let engine = Arc::clone(self);
        self.tasks.spawn(async move {
            engine.traverse(url, remaining).await;
        });
    }

    async fn traverse(self: Arc<Self>, url: String, remaining: i64) {
        // Step 1: cheap checks before touching the lock
        if remaining <= 0 || self.visited.is_full() || self.shutdown.is_cancelled() {
            return;
        }

        // Wait for a fetch slot before claiming the URL, so a task that gets
        // turned away here hasn't used up part of the ceiling
        let permit = match &self.limiter {
            Some(limiter) => tokio::select! {
                permit = limiter.acquire() => match permit {
                    Ok(permit) => Some(permit),
                    // The semaphore is never closed, but don't panic if it is
                    Err(_) => return,
                },
                _ = self.saturated.cancelled() => return,
                _ = self.shutdown.cancelled() => return,
            },
            None => None,
        };

        // Step 2: claim the URL (the only place visited-set decisions happen)
        match self.visited.admit(&url) {
            Admission::Admitted => {}
            Admission::AlreadyVisited => return,
            Admission::CeilingReached => {
                self.saturated.cancel();
                return;
            }
        }
        // We may have taken the last slot; tell everyone else to stop early
        if self.visited.is_full() && !self.saturated.is_cancelled() {
            info!(ceiling = self.visited.ceiling(), "Visit ceiling reached");
            self.saturated.cancel();
        }

        info!("Crawling: {}", url);

        // Step 3: fetch, unless Ctrl-C comes first
        // `biased` checks the shutdown branch first on every poll
        let fetched = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(FetchError::Cancelled { url: url.clone() }),
            result = self.fetcher.fetch(&url) => result,
        };

        let (content_type, body) = match fetched {
            Ok(Fetched::Text { content_type, body }) => (content_type, body),
            Ok(Fetched::NonText { content_type }) => {
                // Visited, but there is nothing to parse or save
                debug!(url = %url, content_type = %content_type, "not a text page, no links to follow");
                self.stats.non_text.fetch_add(1, Ordering::Relaxed);
                return;
            }
            Err(e) => {
                warn!("Error fetching page {}: {}", url, e);
                self.record_failure(&url, &e);
                return;
            }
        };
        self.stats.fetched.fetch_add(1, Ordering::Relaxed);

        // Step 4: Bytes clones share one buffer, so this copies nothing
        if let Some(sink) = &self.sink {
            sink.submit(&url, body.clone());
        }

        // Step 5: raw links -> absolute URLs the filter accepts
        let children = self.accepted_links(&url, &content_type, &body);

        // Parsing is done; let another task fetch while we spawn
        drop(permit);

        // Step 6: fan out, one task per child, one hop less depth each
        for child in children {
            if self.saturated.is_cancelled() || self.shutdown.is_cancelled() {
                break;
            }
            self.spawn_traversal(child, remaining - 1);
        }
    }

    /// Extract + resolve + filter for one page
    fn accepted_links(&self, page_url: &str, content_type: &str, body: &Bytes) -> Vec<String> {
        let mut accepted = Vec::new();
        for raw in extract::extract(body, content_type, self.extractor) {
            self.stats.links_found.fetch_add(1, Ordering::Relaxed);

            match resolve(page_url, &raw) {
                Ok(absolute) if self.filter.allowed(&absolute) => accepted.push(absolute),
                Ok(absolute) => {
                    self.stats.links_rejected.fetch_add(1, Ordering::Relaxed);
                    debug!(url = %absolute, "outside allow pattern");
                }
                // One bad link never stops the rest of the page
                Err(e) => {
                    self.stats.resolution_errors.fetch_add(1, Ordering::Relaxed);
                    debug!("Skipping link on {}: {}", page_url, e);
                }
            }
        }
        accepted
    }

    fn record_failure(&self, url: &str, error: &FetchError) {
        // A poisoned lock still holds a usable Vec; keep recording
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FailedFetch {
                url: url.to_string(),
                error: error.to_string(),
            });
    }

    fn report(
        &self,
        start_url: String,
        downloads: Option<SinkStats>,
        started: Instant,
    ) -> CrawlReport {
        let visited = self.visited.snapshot();
        let mut failed = std::mem::take(
            &mut *self.failures.lock().unwrap_or_else(PoisonError::into_inner),
        );
        // Tasks finish in any order; sort so the report is stable
        failed.sort_by(|a, b| a.url.cmp(&b.url));

        CrawlReport {
            start_url,
            visited_count: visited.len(),
            visited,
            fetched: self.stats.fetched.load(Ordering::Relaxed),
            non_text: self.stats.non_text.load(Ordering::Relaxed),
            failed,
            links_found: self.stats.links_found.load(Ordering::Relaxed),
            links_rejected: self.stats.links_rejected.load(Ordering::Relaxed),
            resolution_errors: self.stats.resolution_errors.load(Ordering::Relaxed),
            ceiling_reached: self.visited.is_full(),
            cancelled: self.shutdown.is_cancelled(),
            downloads,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }
}
