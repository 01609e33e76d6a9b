// src/sink.rs
// =============================================================================
// Best-effort persistence of fetched pages.
//
// The download sink is a small, fixed pool of worker tasks reading from one
// queue. The crawl engine drops (url, body) pairs into the queue and moves on;
// it never waits for a write and never learns whether one failed. The body is
// the one the engine already fetched for link extraction, so saving a page
// costs no extra request.
//
// Failures are logged per page and not retried.
//
// Lifecycle:
//   start()    -> spawns `workers` tasks
//   submit()   -> queues a page (returns false once closed)
//   shutdown() -> closes the queue, lets workers drain it, joins them
// The engine calls shutdown() only after every traversal has finished, so
// nothing queued is lost.
//
// File layout: host/path, where any path that looks like a directory (no
// extension in its last segment) is saved as <path>/index.html. That way
// "/docs" and "/docs/intro" never fight over whether "docs" is a file or a
// directory.
//
// Rust concepts:
// - mpsc::UnboundedSender: the engine never blocks on a slow disk
// - Arc<tokio::sync::Mutex<Receiver>>: several workers share one receiver
// - Mutex<Option<Sender>>: taking the sender out closes the queue
// - dyn PageStore: tests swap the disk for an in-memory map
// =============================================================================

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::error::PersistenceError;

/// Local storage the sink writes into.
#[async_trait]
pub trait PageStore: Send + Sync {
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), PersistenceError>;
}

/// Writes pages as files under a root directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl PageStore for DirStore {
    async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        let io_err = |source| PersistenceError::Io {
            name: name.to_string(),
            source,
        };

        let path = self.root.join(name);
        // "example.com/docs/index.html" needs example.com/docs/ to exist first
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(&path, bytes).await.map_err(io_err)
    }
}

/// Relative file name for a page URL.
///
///   https://example.com/             -> example.com/index.html
///   https://example.com/docs/a.css   -> example.com/docs/a.css
///   https://example.com/docs/        -> example.com/docs/index.html
///   https://example.com/docs         -> example.com/docs/index.html
///   https://example.com/s?q=rust     -> example.com/s/index_q=rust.html
///   https://example.com/a.css?v=2    -> example.com/a.css_v=2
///
/// Returns None for URLs without a host.
pub fn storage_name(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;

    let path = parsed.path();
    // Empty, "." and ".." segments are dropped so nothing escapes the root
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();

    // A page is "directory-like" unless its last segment has an extension
    let directory_like = path.ends_with('/')
        || segments.last().map_or(true, |last| !last.contains('.'));

    let mut parts = vec![sanitize(host)];
    parts.extend(segments.iter().map(|s| sanitize(s)));

    // The query becomes part of the file name, never a directory of its own
    let query = parsed.query().map(|q| format!("_{}", sanitize(q)));
    if directory_like {
        parts.push(format!("index{}.html", query.as_deref().unwrap_or("")));
    } else if let (Some(file), Some(query)) = (parts.last_mut(), query) {
        file.push_str(&query);
    }

    Some(parts.join("/"))
}

// Replaces anything outside a conservative filename alphabet with '_'
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || "-_.=&+,%".contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Totals reported when the sink shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SinkStats {
    pub queued: usize,
    pub written: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
struct Counters {
    queued: AtomicUsize,
    written: AtomicUsize,
    failed: AtomicUsize,
}

struct Download {
    url: String,
    body: Bytes,
}

pub struct DownloadSink {
    queue: Mutex<Option<mpsc::UnboundedSender<Download>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl DownloadSink {
    /// Spawns `workers` tasks writing into `store`. Needs a tokio runtime.
    pub fn start(store: Arc<dyn PageStore>, workers: usize) -> Self {
        // One queue for the whole crawl; unbounded so submit() never waits
        let (tx, rx) = mpsc::unbounded_channel::<Download>();
        // Workers take turns pulling from the single receiver
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let counters = Arc::new(Counters::default());

        let handles = (0..workers.max(1))
            .map(|id| {
                let rx = Arc::clone(&rx);
                let store = Arc::clone(&store);
                let counters = Arc::clone(&counters);
                tokio::spawn(async move {
                    loop {
                        // The lock is held only while waiting for the next item,
                        // then released before the (slow) write
                        let next = rx.lock().await.recv().await;
                        let Some(download) = next else { break };
                        persist(id, store.as_ref(), &counters, download).await;
                    }
                    debug!(worker = id, "download worker finished");
                })
            })
            .collect();

        Self {
            queue: Mutex::new(Some(tx)),
            workers: Mutex::new(handles),
            counters,
        }
    }

    /// Queues a page for saving. Returns false if the sink is shut down.
    pub fn submit(&self, url: &str, body: Bytes) -> bool {
        let queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = queue.as_ref() else {
            return false;
        };

        // send() only fails if every worker is gone
        let sent = tx
            .send(Download {
                url: url.to_string(),
                body,
            })
            .is_ok();
        if sent {
            self.counters.queued.fetch_add(1, Ordering::Relaxed);
        }
        sent
    }

    /// Closes the queue and waits for everything already queued to be handled.
    pub async fn shutdown(&self) -> SinkStats {
        // Dropping the only sender ends each worker's loop once the queue is empty
        drop(self.queue.lock().unwrap_or_else(PoisonError::into_inner).take());

        // Take the handles out so a second shutdown() has nothing to join
        let workers = std::mem::take(&mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner));
        for result in futures::future::join_all(workers).await {
            if let Err(e) = result {
                warn!("download worker crashed: {}", e);
            }
        }

        self.stats()
    }

    pub fn stats(&self) -> SinkStats {
        SinkStats {
            queued: self.counters.queued.load(Ordering::Relaxed),
            written: self.counters.written.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

// Saves one page and updates the counters; never returns an error
async fn persist(worker: usize, store: &dyn PageStore, counters: &Counters, download: Download) {
    // A URL without a host (mailto:, data:) has no sensible file name
    let result = match storage_name(&download.url) {
        Some(name) => store.write(&name, &download.body).await,
        None => Err(PersistenceError::Unnamed {
            url: download.url.clone(),
        }),
    };

    match result {
        Ok(()) => {
            counters.written.fetch_add(1, Ordering::Relaxed);
            debug!(worker, url = %download.url, "saved page");
        }
        Err(e) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            warn!("Error saving page {}: {}", download.url, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore {
        files: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl PageStore for MemoryStore {
        async fn write(&self, name: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
            if name.contains("forbidden") {
                return Err(PersistenceError::Io {
                    name: name.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
                });
            }
            self.files
                .lock()
                .unwrap()
                .insert(name.to_string(), bytes.to_vec());
            Ok(())
        }
    }

    #[test]
    fn test_storage_names() {
        assert_eq!(
            storage_name("https://example.com").as_deref(),
            Some("example.com/index.html")
        );
        assert_eq!(
            storage_name("https://example.com/docs/a.css").as_deref(),
            Some("example.com/docs/a.css")
        );
        assert_eq!(
            storage_name("https://example.com/docs/").as_deref(),
            Some("example.com/docs/index.html")
        );
        assert_eq!(
            storage_name("https://example.com/docs").as_deref(),
            Some("example.com/docs/index.html")
        );
        assert_eq!(
            storage_name("https://example.com/s?q=rust lang").as_deref(),
            Some("example.com/s/index_q=rust%20lang.html")
        );
        assert_eq!(
            storage_name("https://example.com/?page=2").as_deref(),
            Some("example.com/index_page=2.html")
        );
        assert_eq!(
            storage_name("https://example.com/a.css?v=2").as_deref(),
            Some("example.com/a.css_v=2")
        );
        assert_eq!(
            storage_name("http://localhost:8080/a").as_deref(),
            Some("localhost/a/index.html")
        );
        assert_eq!(
            storage_name("https://example.com/x/../../etc/passwd").as_deref(),
            Some("example.com/etc/passwd/index.html")
        );
        assert_eq!(storage_name("mailto:x@example.com"), None);
    }

    #[tokio::test]
    async fn test_drains_queue_on_shutdown() {
        let store = Arc::new(MemoryStore::default());
        let sink = DownloadSink::start(store.clone(), 3);

        for i in 0..50 {
            assert!(sink.submit(&format!("https://example.com/p{i}"), Bytes::from("body")));
        }

        let stats = sink.shutdown().await;
        assert_eq!(stats, SinkStats { queued: 50, written: 50, failed: 0 });
        assert_eq!(store.files.lock().unwrap().len(), 50);
        assert!(!sink.submit("https://example.com/late", Bytes::new()));
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_fatal() {
        let store = Arc::new(MemoryStore::default());
        let sink = DownloadSink::start(store.clone(), 2);

        sink.submit("https://example.com/forbidden", Bytes::from("x"));
        sink.submit("mailto:nobody@example.com", Bytes::from("x"));
        sink.submit("https://example.com/fine", Bytes::from("y"));

        let stats = sink.shutdown().await;
        assert_eq!(stats.written, 1);
        assert_eq!(stats.failed, 2);
        assert_eq!(
            store
                .files
                .lock()
                .unwrap()
                .get("example.com/fine/index.html")
                .map(Vec::as_slice),
            Some(&b"y"[..])
        );
    }

    #[tokio::test]
    async fn test_dir_store_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());

        store
            .write("example.com/docs/index.html", b"<html></html>")
            .await
            .unwrap();

        let saved = std::fs::read(dir.path().join("example.com/docs/index.html")).unwrap();
        assert_eq!(saved, b"<html></html>");
    }

    #[tokio::test]
    async fn test_parent_and_child_pages_both_saved() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DownloadSink::start(Arc::new(DirStore::new(dir.path())), 1);

        // The child needs "docs" as a directory, so the parent can't be a file named "docs"
        sink.submit("https://example.com/docs", Bytes::from("parent"));
        sink.submit("https://example.com/docs/intro", Bytes::from("child"));

        let stats = sink.shutdown().await;
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.written, 2);
        let parent = std::fs::read(dir.path().join("example.com/docs/index.html")).unwrap();
        let child = std::fs::read(dir.path().join("example.com/docs/intro/index.html")).unwrap();
        assert_eq!(parent, b"parent");
        assert_eq!(child, b"child");
    }
}
