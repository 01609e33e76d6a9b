// src/resolve.rs
// =============================================================================
// Turns a raw link (as found in a page) into an absolute URL string.
//
// The `url` crate does the real work: `Url::join` follows the same rules a
// browser uses, so relative paths ("../b.html"), protocol-relative links
// ("//cdn.example.com/x.js") and absolute links all resolve correctly.
//
// The returned string is the canonical form used as the dedup key. Two links
// are "the same page" only if their resolved strings are byte-for-byte equal.
// Fragments are kept: "page.html#foo" and "page.html" are different keys.
// Fragment-only links ("#foo") never get here; the extractors drop them.
// =============================================================================

use url::Url;

use crate::error::ResolutionError;

/// Resolves `link` against the page it was found on.
///
/// Examples:
///   base = "https://h/x/a.html", link = "../b.html"    -> "https://h/b.html"
///   base = "https://h/x/a.html", link = "//cdn.io/s.js" -> "https://cdn.io/s.js"
///   base = "https://h/x/a.html", link = "https://o.org" -> "https://o.org/"
pub fn resolve(base: &str, link: &str) -> Result<String, ResolutionError> {
    let base_url = Url::parse(base).map_err(|source| ResolutionError::InvalidBase {
        base: base.to_string(),
        source,
    })?;

    // Attribute values often carry stray whitespace; browsers ignore it too
    let link = link.trim();

    base_url
        .join(link)
        .map(String::from)
        .map_err(|source| ResolutionError::InvalidLink {
            base: base.to_string(),
            link: link.to_string(),
            source,
        })
}
