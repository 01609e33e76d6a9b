// src/main.rs
// =============================================================================
// This is the entry point of the crawler.
//
// What happens here:
// 1. Set up logging (tracing, filtered by RUST_LOG, written to stderr)
// 2. Parse command-line arguments and validate them into a CrawlConfig
// 3. Build the HTTP fetcher and, if asked, the download sink
// 4. Run the crawl until every traversal has finished (or Ctrl-C)
// 5. Print the report and exit (0 = crawl completed, 2 = setup error)
//
// Individual page failures never change the exit code: they are logged as
// they happen and listed in the report.
// =============================================================================

mod cli;
mod config;
mod crawl;
mod error;
mod extract;
mod fetch;
mod resolve;
mod sink;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use config::CrawlConfig;
use crawl::{CrawlReport, Crawler, FailedFetch};
use fetch::HttpFetcher;
use sink::{DirStore, DownloadSink};

#[tokio::main]
async fn main() {
    init_tracing();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,reqwest=warn,hyper=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = CrawlConfig::from_cli(&cli).context("invalid crawl settings")?;

    let fetcher = HttpFetcher::new(&config.user_agent, config.request_timeout)?;
    let mut crawler = Crawler::new(&config, Arc::new(fetcher));

    if let Some(dir) = &config.download_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("cannot create download directory {}", dir.display()))?;
        let store = DirStore::new(dir);
        info!(dir = %store.root().display(), workers = config.workers, "Saving fetched pages");
        crawler = crawler.with_sink(DownloadSink::start(Arc::new(store), config.workers));
    }

    // Ctrl-C stops new work and aborts in-flight fetches; the report still prints
    let shutdown = crawler.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping crawl");
            shutdown.cancel();
        }
    });

    let report = crawler.run().await;
    print_report(&report, cli.json)?;

    Ok(0)
}

fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_summary(report);
    }
    Ok(())
}

fn print_summary(report: &CrawlReport) {
    println!("Visited URLs:");
    for url in &report.visited {
        println!("   {}", url);
    }

    if !report.failed.is_empty() {
        println!();
        println!("Failed:");
        for FailedFetch { url, error } in &report.failed {
            println!("   {:<60} {}", url, error);
        }
    }

    println!();
    println!("📊 Summary:");
    println!("   🌐 Visited: {}", report.visited_count);
    println!("   📄 Parsed: {}", report.fetched);
    println!("   🖼️  Not text: {}", report.non_text);
    println!("   ❌ Failed: {}", report.failed.len());
    println!(
        "   🔗 Links: {} found, {} outside the allow pattern, {} unresolvable",
        report.links_found, report.links_rejected, report.resolution_errors
    );
    if let Some(downloads) = &report.downloads {
        println!(
            "   💾 Saved: {} of {} ({} failed)",
            downloads.written, downloads.queued, downloads.failed
        );
    }
    if report.ceiling_reached {
        println!("   ⛔ Stopped at the visit ceiling");
    }
    if report.cancelled {
        println!("   ⏹️  Interrupted");
    }
    println!("   ⏱️  {} ms", report.elapsed_ms);

    println!();
    println!("End of crawling. Number of visited links: {}", report.visited_count);
}
