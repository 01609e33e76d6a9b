// src/crawl/visited.rs
// =============================================================================
// The visited set: the single piece of shared decision state in a crawl.
//
// Every traversal task asks it one question, "may I fetch this URL?", and the
// answer must be decided atomically: checking membership, checking the visit
// ceiling and inserting all happen under one lock. That is what guarantees
// each URL is fetched at most once and that the set never grows past the
// ceiling, however many tasks race on the same link.
//
// `len()` is also mirrored into an atomic so the engine can take a cheap,
// lock-free look before bothering with the lock. That look is only a
// shortcut; `admit` is what decides.
//
// Rust concepts:
// - std::sync::Mutex (not tokio's): the lock is never held across an .await
// - PoisonError::into_inner: a panicked task doesn't wedge the whole crawl
// =============================================================================

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Outcome of asking to visit a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The URL was new and has been recorded; the caller owns fetching it
    Admitted,
    /// Another task already claimed this URL
    AlreadyVisited,
    /// The set is full; nothing new gets in
    CeilingReached,
}

#[derive(Debug)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
    len: AtomicUsize,
    ceiling: usize,
}

impl VisitedSet {
    pub fn new(ceiling: usize) -> Self {
        Self {
            urls: Mutex::new(HashSet::with_capacity(ceiling.min(1024))),
            len: AtomicUsize::new(0),
            ceiling,
        }
    }

    /// Check-and-insert in one critical section.
    pub fn admit(&self, url: &str) -> Admission {
        // A panic while holding this lock can't leave the set half-updated
        // (insert is the only mutation), so a poisoned lock is still usable
        let mut urls = self.urls.lock().unwrap_or_else(PoisonError::into_inner);

        if urls.contains(url) {
            return Admission::AlreadyVisited;
        }
        if urls.len() >= self.ceiling {
            return Admission::CeilingReached;
        }

        urls.insert(url.to_string());
        self.len.store(urls.len(), Ordering::Release);
        Admission::Admitted
    }

    /// Lock-free, possibly stale size of the set
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Lock-free, possibly stale "is the set full?"
    pub fn is_full(&self) -> bool {
        self.len() >= self.ceiling
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Sorted copy of every admitted URL
    pub fn snapshot(&self) -> Vec<String> {
        let urls = self.urls.lock().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<String> = urls.iter().cloned().collect();
        out.sort();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_admit_once() {
        let visited = VisitedSet::new(10);
        assert_eq!(visited.admit("https://a/"), Admission::Admitted);
        assert_eq!(visited.admit("https://a/"), Admission::AlreadyVisited);
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_exact_ceiling() {
        let visited = VisitedSet::new(2);
        assert_eq!(visited.admit("https://a/1"), Admission::Admitted);
        assert_eq!(visited.admit("https://a/2"), Admission::Admitted);
        assert!(visited.is_full());
        assert_eq!(visited.admit("https://a/3"), Admission::CeilingReached);
        // Already-present URLs still report as visited, not as over the ceiling
        assert_eq!(visited.admit("https://a/1"), Admission::AlreadyVisited);
        assert_eq!(visited.snapshot(), vec!["https://a/1", "https://a/2"]);
    }

    #[test]
    fn test_byte_wise_keys() {
        let visited = VisitedSet::new(10);
        assert_eq!(visited.admit("https://a/page.html"), Admission::Admitted);
        assert_eq!(visited.admit("https://a/page.html#foo"), Admission::Admitted);
        assert_eq!(visited.admit("https://a/page.html/"), Admission::Admitted);
        assert_eq!(visited.len(), 3);
    }

    #[test]
    fn test_concurrent_admission_is_exclusive() {
        let visited = Arc::new(VisitedSet::new(1000));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let visited = Arc::clone(&visited);
                thread::spawn(move || {
                    (0..100)
                        .filter(|i| visited.admit(&format!("https://a/{i}")) == Admission::Admitted)
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 100);
        assert_eq!(visited.len(), 100);
    }

    #[test]
    fn test_concurrent_ceiling_never_overshoots() {
        let visited = Arc::new(VisitedSet::new(25));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let visited = Arc::clone(&visited);
                thread::spawn(move || {
                    for i in 0..100 {
                        visited.admit(&format!("https://a/{t}/{i}"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(visited.len(), 25);
        assert_eq!(visited.snapshot().len(), 25);
    }
}
