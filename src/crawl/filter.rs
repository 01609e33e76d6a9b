// src/crawl/filter.rs
// =============================================================================
// Decides which resolved URLs are eligible to be crawled.
//
// One compiled regex, matched anywhere in the absolute URL (anchor it with ^
// if you mean "starts with"). URLs that don't match are dropped silently:
// they are never fetched and never counted as visited.
// =============================================================================

use regex::Regex;
use url::Url;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct AllowFilter {
    pattern: Regex,
}

impl AllowFilter {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Pattern admitting everything on the seed's scheme and host
    ///
    /// "https://example.com/docs/" -> ^https://example\.com(?:[:/?#]|$)
    pub fn same_origin(start: &Url) -> Result<Self, ConfigError> {
        let host = start
            .host_str()
            .ok_or_else(|| ConfigError::NoHost(start.to_string()))?;
        let pattern = format!(
            "^{}://{}(?:[:/?#]|$)",
            regex::escape(start.scheme()),
            regex::escape(host)
        );
        Self::new(&pattern)
    }

    pub fn allowed(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unanchored_match() {
        let filter = AllowFilter::new("github.com/.+").unwrap();
        assert!(filter.allowed("https://github.com/rust-lang/rust"));
        assert!(!filter.allowed("https://gitlab.com/rust-lang/rust"));
    }

    #[test]
    fn test_same_origin() {
        let start = Url::parse("https://example.com/docs/").unwrap();
        let filter = AllowFilter::same_origin(&start).unwrap();
        assert!(filter.allowed("https://example.com/"));
        assert!(filter.allowed("https://example.com"));
        assert!(filter.allowed("https://example.com:443/x"));
        assert!(!filter.allowed("https://example.com.evil.net/"));
        assert!(!filter.allowed("http://example.com/"));
        assert!(!filter.allowed("https://other.org/?u=https://example.com/"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(AllowFilter::new("[unclosed").is_err());
    }
}
