// src/fetch.rs
// =============================================================================
// Downloads pages over HTTP.
//
// The crawl engine only talks to the `Fetcher` trait, so tests can crawl an
// in-memory site and the real crawler uses `HttpFetcher` (reqwest).
//
// Outcomes of a fetch:
// - Ok(Fetched::Text)    -> 2xx with a text/* content type, body attached
// - Ok(Fetched::NonText) -> 2xx but not text (images, PDFs, ...): no body,
//                           no links, but NOT a failure
// - Err(FetchError)      -> non-2xx status, timeout, DNS/TLS/connect error
//
// Client settings:
// - 5s connect timeout
// - 30s TCP keep-alive, pooled connections reused across pages
// - an overall per-request timeout (default 30s), which also bounds the TLS
//   handshake since reqwest has no separate knob for it
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::error::{ConfigError, FetchError};

/// Connect timeout for every request
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// TCP keep-alive interval for pooled connections
pub const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub enum Fetched {
    /// A text/* response and its body
    Text { content_type: String, body: Bytes },
    /// Anything else; the body is never read
    NonText { content_type: String },
}

/// Something that can GET a URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Fetched, FetchError>;
}

/// The reqwest-backed fetcher used by the binary.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    // Client is reference counted internally; clones share one connection pool
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, request_timeout: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(CONNECT_TIMEOUT)
            .tcp_keepalive(KEEP_ALIVE)
            .timeout(request_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(ConfigError::Client)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        // Don't download bodies we won't parse
        if !is_text_content_type(&content_type) {
            return Ok(Fetched::NonText { content_type });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        Ok(Fetched::Text { content_type, body })
    }
}

/// True when the content type's type part is "text".
///
/// "text/html; charset=utf-8" -> true, "application/json" -> false,
/// missing header ("") -> false.
pub fn is_text_content_type(content_type: &str) -> bool {
    content_type
        .trim_start()
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("text/"))
}
