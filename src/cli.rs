// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The CLI is a thin layer: it collects the seed input (start URL, allow
// pattern, depth, visit ceiling) plus a few knobs, and `CrawlConfig::from_cli`
// turns it into a validated configuration.
// =============================================================================

use std::path::PathBuf;

use clap::Parser;

use crate::config::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_VISITS, DEFAULT_TIMEOUT_SECS, DEFAULT_WORKERS};
use crate::extract::ExtractorKind;

#[derive(Parser, Debug)]
#[command(
    name = "bounded-crawler",
    version = "0.1.0",
    about = "Crawl a website up to a maximum depth and a maximum number of pages",
    long_about = "bounded-crawler starts at a URL, follows every link matching an allow pattern, \
                  and stops when it runs out of links, reaches the maximum depth, or has visited \
                  the maximum number of distinct URLs."
)]
pub struct Cli {
    /// URL to start crawling from (must be absolute)
    ///
    /// Example: bounded-crawler https://example.com/docs/
    pub start_url: String,

    /// Regular expression a resolved link must match to be followed
    ///
    /// Matched anywhere in the URL; anchor with ^ for a prefix match.
    /// Defaults to the start URL's scheme and host.
    #[arg(long)]
    pub allow: Option<String>,

    /// Maximum number of link hops from the start URL
    ///
    /// 0 = just the start page, 1 = the start page and the pages it links to
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: u32,

    /// Maximum number of distinct URLs to visit
    #[arg(long, default_value_t = DEFAULT_MAX_VISITS)]
    pub max_visits: usize,

    /// Maximum number of pages fetched at the same time (default: unbounded)
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// How links are pulled out of HTML pages
    #[arg(long, value_enum, default_value_t = ExtractorKind::Html)]
    pub extractor: ExtractorKind,

    /// Save every fetched text page under this directory
    #[arg(long)]
    pub download_dir: Option<PathBuf>,

    /// Number of download workers (only with --download-dir)
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// User-Agent header sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Print the final report as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why Option<String> for --allow?
//    - "not given" is different from "given as an empty pattern"
//    - The empty regex matches everything, which is a legitimate choice
//
// 2. Why is max_depth a u32 but max_visits a usize?
//    - max_depth is a hop count and never indexes anything
//    - max_visits is compared against a collection length
// -----------------------------------------------------------------------------
