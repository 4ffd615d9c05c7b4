//! Static HTML for published pages and previews.
//!
//! Text blocks support `**bold**` and `*italic*` and keep line breaks. A
//! marker only opens a span when a matching marker follows it; otherwise it
//! is emitted literally. Everything else is escaped.

use crate::editing::block::{Block, BlockContent, BlockKind};

pub fn render_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(render_block)
        .filter(|html| !html.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_block(block: &Block) -> String {
    match (&block.content, block.kind) {
        (BlockContent::Text(text), BlockKind::Paragraph) => {
            format!("<p>{}</p>", render_inline(text))
        }
        (BlockContent::Text(text), kind) => match kind.heading_level() {
            Some(level) => format!("<h{level}>{}</h{level}>", render_inline(text)),
            None => format!("<p>{}</p>", render_inline(text)),
        },
        (BlockContent::Image(image), _) if image.source.is_empty() => String::new(),
        (BlockContent::Image(image), _) => format!(
            r#"<img src="{}" alt="{}" width="{}" height="{}" />"#,
            html_escape::encode_double_quoted_attribute(&image.source),
            html_escape::encode_double_quoted_attribute(
                image.alt_text.as_deref().unwrap_or_default()
            ),
            image.width,
            image.height,
        ),
    }
}

/// Inline markup of one text block
pub fn render_inline(text: &str) -> String {
    let mut html = String::with_capacity(text.len());
    let mut plain = String::new();
    let mut bold = false;
    let mut italic = false;
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        let after = &rest[c.len_utf8()..];
        match c {
            '\n' => {
                flush(&mut html, &mut plain);
                html.push_str("<br />");
                rest = after;
            }
            '*' if after.starts_with('*') => {
                let tail = &after[1..];
                if bold || tail.contains("**") {
                    flush(&mut html, &mut plain);
                    html.push_str(if bold { "</strong>" } else { "<strong>" });
                    bold = !bold;
                } else {
                    plain.push_str("**");
                }
                rest = tail;
            }
            '*' => {
                if italic || after.contains('*') {
                    flush(&mut html, &mut plain);
                    html.push_str(if italic { "</em>" } else { "<em>" });
                    italic = !italic;
                } else {
                    plain.push('*');
                }
                rest = after;
            }
            _ => {
                plain.push(c);
                rest = after;
            }
        }
    }
    flush(&mut html, &mut plain);
    if italic {
        html.push_str("</em>");
    }
    if bold {
        html.push_str("</strong>");
    }
    html
}

fn flush(html: &mut String, plain: &mut String) {
    if !plain.is_empty() {
        html.push_str(&html_escape::encode_text(plain.as_str()));
        plain.clear();
    }
}
