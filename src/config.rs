// src/config.rs
// =============================================================================
// Crawl configuration.
//
// `CrawlConfig` is everything a crawl needs to know before it starts. The CLI
// builds one with `from_cli`; tests build one with `new` and tweak fields.
// Seed input is validated here, once, so the engine never has to deal with an
// unparseable start URL, a broken regex or a zero ceiling.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::cli::Cli;
use crate::crawl::AllowFilter;
use crate::error::ConfigError;
use crate::extract::ExtractorKind;

pub const DEFAULT_MAX_DEPTH: u32 = 2;
pub const DEFAULT_MAX_VISITS: usize = 100;
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.3";

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Seed URL, already parsed
    pub start_url: Url,
    /// Which resolved links may be followed
    pub filter: AllowFilter,
    /// Link hops from the seed; 0 fetches only the seed
    pub max_depth: u32,
    /// Ceiling on distinct URLs visited
    pub max_visits: usize,
    /// Cap on simultaneous fetches; None means unbounded
    pub max_concurrency: Option<usize>,
    pub extractor: ExtractorKind,
    /// Where fetched pages are saved; None disables the download sink
    pub download_dir: Option<PathBuf>,
    /// Download sink worker count
    pub workers: usize,
    pub user_agent: String,
    pub request_timeout: Duration,
}

impl CrawlConfig {
    /// Config with defaults for everything but the seed and the allow pattern.
    ///
    /// Without a pattern, links are followed only on the seed's scheme and host.
    pub fn new(start_url: &str, allow: Option<&str>) -> Result<Self, ConfigError> {
        let start_url = Url::parse(start_url).map_err(|source| ConfigError::StartUrl {
            url: start_url.to_string(),
            source,
        })?;
        if start_url.host_str().is_none() {
            return Err(ConfigError::NoHost(start_url.to_string()));
        }

        let filter = match allow {
            Some(pattern) => AllowFilter::new(pattern)?,
            None => AllowFilter::same_origin(&start_url)?,
        };

        Ok(Self {
            start_url,
            filter,
            max_depth: DEFAULT_MAX_DEPTH,
            max_visits: DEFAULT_MAX_VISITS,
            max_concurrency: None,
            extractor: ExtractorKind::default(),
            download_dir: None,
            workers: DEFAULT_WORKERS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = Self::new(&cli.start_url, cli.allow.as_deref())?;
        config.max_depth = cli.max_depth;
        config.max_visits = cli.max_visits;
        config.max_concurrency = cli.max_concurrency;
        config.extractor = cli.extractor;
        config.download_dir = cli.download_dir.clone();
        config.workers = cli.workers;
        if let Some(ua) = &cli.user_agent {
            config.user_agent = ua.clone();
        }
        config.request_timeout = Duration::from_secs(cli.timeout);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_visits == 0 {
            return Err(ConfigError::ZeroCeiling);
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers("workers"));
        }
        if self.max_concurrency == Some(0) {
            return Err(ConfigError::ZeroWorkers("max concurrency"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let config = CrawlConfig::new("https://example.com/docs/", None).unwrap();
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.max_visits, DEFAULT_MAX_VISITS);
        assert!(config.filter.allowed("https://example.com/blog"));
        assert!(!config.filter.allowed("https://elsewhere.org/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_relative_start_url() {
        let err = CrawlConfig::new("/just/a/path", None).unwrap_err();
        assert!(matches!(err, ConfigError::StartUrl { .. }));
    }

    #[test]
    fn test_rejects_hostless_start_url() {
        let err = CrawlConfig::new("mailto:someone@example.com", None).unwrap_err();
        assert!(matches!(err, ConfigError::NoHost(_)));
    }

    #[test]
    fn test_from_cli() {
        let cli = Cli::parse_from([
            "bounded-crawler",
            "https://github.com/axi0mX/ipwndfu/issues/141",
            "--allow",
            "https://github.com/.+",
            "--max-depth",
            "3",
            "--max-visits",
            "50",
            "--extractor",
            "regex",
        ]);
        let config = CrawlConfig::from_cli(&cli).unwrap();
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.max_visits, 50);
        assert_eq!(config.extractor, ExtractorKind::Regex);
        assert_eq!(config.filter.as_str(), "https://github.com/.+");
    }

    #[test]
    fn test_from_cli_rejects_zero_ceiling() {
        let cli = Cli::parse_from(["bounded-crawler", "https://example.com", "--max-visits", "0"]);
        assert!(matches!(CrawlConfig::from_cli(&cli), Err(ConfigError::ZeroCeiling)));
    }
}
