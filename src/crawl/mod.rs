// src/crawl/mod.rs
// =============================================================================
// This module is the crawler itself.
//
// Submodules:
// - engine: spawns and runs traversals, the core of the crawler
// - visited: the shared visited set (dedup + visit ceiling)
// - filter: the allow-pattern
// - report: what a finished crawl hands back
// =============================================================================

mod engine;
mod filter;
mod report;
mod visited;

pub use engine::Crawler;
pub use filter::AllowFilter;
pub use report::{CrawlReport, FailedFetch};
