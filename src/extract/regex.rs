// src/extract/regex.rs
// =============================================================================
// Regex fallback extractor.
//
// Matches exactly two shapes, anywhere in the text:
//   href="..."   and   src="..."
//
// No tag awareness at all: an href inside a comment or a <div> counts too.
// Only double-quoted values are recognized. Skip rules match the HTML
// extractor, so on ordinary pages both produce the same links.
// =============================================================================

use std::sync::OnceLock;

use ::regex::Regex;

use super::is_followable;

fn attribute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"href="([^"]+)"|src="([^"]+)""#).expect("attribute pattern is valid")
    })
}

/// Scans text for href="..." and src="..." values.
pub fn extract_regex_links(text: &str) -> Vec<String> {
    attribute_pattern()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str())
        .filter(|raw| is_followable(raw))
        .map(String::from)
        .collect()
}
