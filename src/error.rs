// src/error.rs
// =============================================================================
// Error types for the crawler.
//
// Every error here is local to one page or one link. None of them stops the
// crawl: the engine logs them, records them in the report and moves on.
//
// - ResolutionError: a link could not be turned into an absolute URL
// - FetchError: a page could not be downloaded (bad status or transport)
// - PersistenceError: a fetched page could not be written to storage
// - ConfigError: the seed input itself is unusable (checked before crawling)
// =============================================================================

use thiserror::Error;

/// A raw link that cannot be resolved against its page URL.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("invalid base URL '{base}': {source}")]
    InvalidBase {
        base: String,
        #[source]
        source: url::ParseError,
    },

    #[error("cannot resolve '{link}' against '{base}': {source}")]
    InvalidLink {
        base: String,
        link: String,
        #[source]
        source: url::ParseError,
    },
}

/// A page that could not be fetched.
///
/// Non-text responses are not errors; see `fetch::Fetched::NonText`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("fetch of {url} cancelled")]
    Cancelled { url: String },
}

impl FetchError {
    /// Maps a reqwest error onto the taxonomy above
    pub fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout { url: url.to_string() }
        } else if let Some(status) = error.status() {
            FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// Writing a page to local storage failed.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to store {url}: cannot derive a file name")]
    Unnamed { url: String },
}

/// The crawl cannot start with the given input.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid start URL '{url}': {source}")]
    StartUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("start URL '{0}' has no host")]
    NoHost(String),

    #[error("invalid allow pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("max visits must be at least 1")]
    ZeroCeiling,

    #[error("{0} must be at least 1")]
    ZeroWorkers(&'static str),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message_names_url() {
        let err = FetchError::Status {
            url: "https://example.com/x".to_string(),
            status: 500,
        };
        assert_eq!(err.to_string(), "HTTP 500 for https://example.com/x");
    }

    #[test]
    fn test_pattern_error_converts() {
        let err: ConfigError = regex::Regex::new("(").unwrap_err().into();
        assert!(matches!(err, ConfigError::Pattern(_)));
    }
}
