// src/extract/html.rs
// =============================================================================
// Extracts raw links from HTML pages with the `scraper` crate.
//
// scraper parses HTML into a DOM using html5ever, the same error-recovering
// parser browsers are modeled on. Unclosed tags, stray quotes and garbage in
// between are recovered from, so "malformed markup" just means some elements
// end up where the parser decided they belong.
//
// We read two attributes:
// - href on <a>, <area> and <link>
// - src on <script>, <img>, <iframe>, <frame> and <source>
//
// Values are returned untouched (no resolution, no filtering) in document
// order, minus empty and fragment-only values.
// =============================================================================

use std::sync::OnceLock;

use scraper::{Html, Selector};

use super::is_followable;

// Every tag we care about, in one selector group so matches come back in
// document order
const LINK_SELECTOR: &str = "a[href], area[href], link[href], \
     script[src], img[src], iframe[src], frame[src], source[src]";

fn link_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    // The selector is a constant, so a parse failure is a programmer error
    SELECTOR.get_or_init(|| Selector::parse(LINK_SELECTOR).expect("link selector is valid CSS"))
}

/// Extracts raw href/src values from an HTML document.
///
/// Example:
///   html = "<a href='/docs'>Docs</a><script src='app.js'></script>"
///   result = ["/docs", "app.js"]
pub fn extract_html_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let mut links = Vec::new();
    for element in document.select(link_selector()) {
        let value = element.value();
        for attr in ["href", "src"] {
            if let Some(raw) = value.attr(attr) {
                if is_followable(raw) {
                    links.push(raw.to_string());
                }
            }
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_anchor_href() {
        let html = r#"<a href="https://www.rust-lang.org">Rust</a>"#;
        assert_eq!(extract_html_links(html), vec!["https://www.rust-lang.org"]);
    }

    #[test]
    fn test_relative_links_are_not_resolved() {
        let html = r#"<a href="/docs">Docs</a><a href="../about">About</a>"#;
        assert_eq!(extract_html_links(html), vec!["/docs", "../about"]);
    }

    #[test]
    fn test_skips_fragment_only() {
        let html = r##"<a href="#section">Section</a><a href="page.html#foo">Foo</a>"##;
        assert_eq!(extract_html_links(html), vec!["page.html#foo"]);
    }

    #[test]
    fn test_link_and_script_tags() {
        let html = r#"
            <link rel="stylesheet" href="main.css">
            <script src="/js/app.js"></script>
            <script>var inline = 1;</script>
        "#;
        assert_eq!(extract_html_links(html), vec!["main.css", "/js/app.js"]);
    }

    #[test]
    fn test_ignores_unrelated_attributes() {
        let html = r#"<div href="/not-a-link"></div><a name="anchor">x</a>"#;
        assert!(extract_html_links(html).is_empty());
    }

    #[test]
    fn test_malformed_markup_keeps_going() {
        let html = r#"<a href="/one">one<div><p></span><a href="/two" <b>two</a><<<a href="/three">"#;
        let links = extract_html_links(html);
        assert!(links.contains(&"/one".to_string()));
        assert!(links.contains(&"/three".to_string()));
    }
}
