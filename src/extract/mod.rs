// src/extract/mod.rs
// =============================================================================
// Link extraction: raw page bytes in, raw link strings out.
//
// Submodules:
// - html: structural extraction with scraper (the default)
// - regex: a plain `href="..."` / `src="..."` scanner, for when structure
//   doesn't matter or the markup is too broken to be worth parsing
// - markdown: link and image destinations from text/markdown pages
//
// Links come out exactly as written in the page. Resolution against the page
// URL and the allow-filter are the engine's job, not ours.
//
// Extraction never fails. Broken markup yields fewer links, not an error,
// and bytes that aren't valid UTF-8 are decoded lossily.
// =============================================================================

mod html;
mod markdown;
mod regex;

use clap::ValueEnum;

use self::html::extract_html_links;
use self::markdown::extract_markdown_links;
use self::regex::extract_regex_links;

/// Which extractor handles HTML (and any other non-Markdown text) pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExtractorKind {
    /// Parse the document and read attributes of link-bearing tags
    #[default]
    Html,
    /// Scan the raw text for href="..." and src="..."
    Regex,
}

/// Extracts raw links from a fetched page.
///
/// `content_type` is the response's Content-Type header. A `text/markdown`
/// page always goes through the Markdown extractor; everything else goes
/// through the extractor selected by `kind`.
///
/// The page is parsed eagerly: every link is collected before this returns,
/// and the iterator just walks that list. The parsed document borrows the
/// decoded text, so it can't be handed out lazily.
pub fn extract(
    body: &[u8],
    content_type: &str,
    kind: ExtractorKind,
) -> impl Iterator<Item = String> {
    let text = String::from_utf8_lossy(body);

    let links = if is_markdown(content_type) {
        extract_markdown_links(&text)
    } else {
        match kind {
            ExtractorKind::Html => extract_html_links(&text),
            ExtractorKind::Regex => extract_regex_links(&text),
        }
    };

    links.into_iter()
}

/// Whether a raw attribute value is worth resolving at all.
///
/// Empty values and fragment-only links ("#top") point back at the page
/// they're on, so they are dropped before resolution.
pub(crate) fn is_followable(raw: &str) -> bool {
    let raw = raw.trim();
    !raw.is_empty() && !raw.starts_with('#')
}

fn is_markdown(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/markdown" || mime == "text/x-markdown"
}
