// src/extract/markdown.rs
// =============================================================================
// Extracts link destinations from Markdown pages (text/markdown).
//
// pulldown-cmark turns Markdown into a stream of events. A link shows up as
// Start(Link) .. End(Link) and an image as Start(Image) .. End(Image); the
// destination URL is carried on the Start event, so that's all we look at.
//
// Unlike an HTML page, relative destinations are common here ("./setup.md"),
// so nothing is filtered out except empty and fragment-only destinations.
// Raw HTML embedded in Markdown is not scanned.
// =============================================================================

use pulldown_cmark::{Event, Parser, Tag};

use super::is_followable;

/// Extracts link and image destinations from Markdown text.
///
/// Example:
///   "Check out [Rust](https://www.rust-lang.org) and ![logo](logo.png)"
///   -> ["https://www.rust-lang.org", "logo.png"]
pub fn extract_markdown_links(markdown: &str) -> Vec<String> {
    Parser::new(markdown)
        .filter_map(|event| match event {
            // In pulldown-cmark 0.9, both tags are (link_type, dest_url, title)
            Event::Start(Tag::Link(_, dest, _)) | Event::Start(Tag::Image(_, dest, _)) => {
                Some(dest.to_string())
            }
            _ => None,
        })
        .filter(|dest| is_followable(dest))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_link() {
        let markdown = "Check out [Rust](https://www.rust-lang.org)!";
        assert_eq!(extract_markdown_links(markdown), vec!["https://www.rust-lang.org"]);
    }

    #[test]
    fn test_relative_and_image_links() {
        let markdown = r#"
# Resources

- [Setup](./setup.md)
- ![Logo](img/logo.png)
- [Up](../README.md)
        "#;
        assert_eq!(
            extract_markdown_links(markdown),
            vec!["./setup.md", "img/logo.png", "../README.md"]
        );
    }

    #[test]
    fn test_skip_fragment_links() {
        let markdown = "Jump to [usage](#usage) or [api](api.md#usage)";
        assert_eq!(extract_markdown_links(markdown), vec!["api.md#usage"]);
    }

    #[test]
    fn test_reference_style_links() {
        let markdown = "See [the docs][docs].\n\n[docs]: https://docs.rs/\n";
        assert_eq!(extract_markdown_links(markdown), vec!["https://docs.rs/"]);
    }
}
