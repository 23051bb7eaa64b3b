//! Markdown to plain text conversion.
//!
//! The document is walked through pulldown-cmark events and reduced to the
//! visible text: headers, emphasis markers and link/image targets are
//! dropped while link text and image alt text survive. Optional YAML
//! frontmatter is stripped before parsing.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use regex::Regex;

use crate::core::errors::ApiError;

pub fn extract(bytes: &[u8], filename: &str) -> Result<String, ApiError> {
    let content = std::str::from_utf8(bytes)
        .map_err(|_| ApiError::extraction(filename, "unparseable"))?;

    let content = strip_frontmatter(content);
    Ok(to_plain_text(content))
}

fn strip_frontmatter(content: &str) -> &str {
    let frontmatter = Regex::new(r"(?s)^---\s*\n.*?\n---\s*\n").expect("static regex");
    match frontmatter.find(content) {
        Some(matched) => &content[matched.end()..],
        None => content,
    }
}

fn to_plain_text(content: &str) -> String {
    let parser = Parser::new(content);
    let mut text = String::new();

    for event in parser {
        match event {
            Event::Text(chunk) | Event::Code(chunk) => text.push_str(&chunk),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::CodeBlock
                | TagEnd::BlockQuote(_)
                | TagEnd::TableRow,
            ) => text.push('\n'),
            Event::Start(Tag::Item) => text.push('\n'),
            Event::Rule => text.push('\n'),
            // Raw HTML islands are markup, not content.
            Event::Html(_) | Event::InlineHtml(_) => {}
            _ => {}
        }
    }

    let lines: Vec<&str> = text
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect();
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_is_removed_but_text_survives() {
        let md = b"# Title\n\nSome **bold** and *italic* text with `code`.\n";
        let text = extract(md, "doc.md").unwrap();
        assert!(text.contains("Title"));
        assert!(text.contains("Some bold and italic text with code."));
        assert!(!text.contains('#'));
        assert!(!text.contains("**"));
    }

    #[test]
    fn link_text_is_kept_and_target_dropped() {
        let md = b"See [the docs](https://example.com/docs) for details.";
        let text = extract(md, "doc.md").unwrap();
        assert!(text.contains("See the docs for details."));
        assert!(!text.contains("example.com"));
    }

    #[test]
    fn image_alt_text_is_kept() {
        let md = b"![diagram of the pipeline](img/pipe.png)";
        let text = extract(md, "doc.md").unwrap();
        assert!(text.contains("diagram of the pipeline"));
        assert!(!text.contains("img/pipe.png"));
    }

    #[test]
    fn frontmatter_is_stripped() {
        let md = b"---\ntitle: secret\ntags: [a, b]\n---\n\nBody text.\n";
        let text = extract(md, "doc.md").unwrap();
        assert_eq!(text, "Body text.");
    }

    #[test]
    fn raw_html_is_dropped() {
        let md = b"before\n\n<div class=\"x\">inner</div>\n\nafter";
        let text = extract(md, "doc.md").unwrap();
        assert!(text.contains("before"));
        assert!(text.contains("after"));
        assert!(!text.contains("<div"));
    }

    #[test]
    fn invalid_utf8_is_unparseable() {
        let err = extract(&[0xff, 0xfe, 0x00], "doc.md").unwrap_err();
        assert!(matches!(err, ApiError::Extraction { .. }));
    }
}
