// src/crawl/report.rs
// Final outcome of a crawl run.

use serde::Serialize;

use crate::sink::SinkStats;

/// A page that could not be fetched, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFetch {
    pub url: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub start_url: String,
    /// Number of distinct URLs admitted to the visited set
    pub visited_count: usize,
    /// Every admitted URL, sorted
    pub visited: Vec<String>,
    /// Text pages fetched and parsed
    pub fetched: usize,
    /// Pages fetched whose content type wasn't text/*
    pub non_text: usize,
    pub failed: Vec<FailedFetch>,
    /// Raw links seen across all pages
    pub links_found: usize,
    /// Resolved links dropped by the allow-filter
    pub links_rejected: usize,
    pub resolution_errors: usize,
    pub ceiling_reached: bool,
    pub cancelled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloads: Option<SinkStats>,
    pub elapsed_ms: u64,
}
