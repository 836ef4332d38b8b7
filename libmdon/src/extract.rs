//! Plain-text extraction from status HTML
//!
//! Status bodies arrive as HTML fragments (`<p>`, `<br>`, mention links and
//! so on). The terminal wants plain text, so markup is dropped and only
//! `<br>` elements turn into newlines. Paragraph boundaries do not produce a
//! separator: `<p>a</p><p>b</p>` becomes `ab`.

use scraper::{Html, Node};

const LINE_BREAKS: &[char] = &['\r', '\n'];

/// Convert an HTML fragment into plain text
///
/// Text nodes are appended with surrounding CR/LF trimmed, and a newline is
/// emitted after each `br` element. Input without any `<` is returned as-is.
///
/// The html5ever parser behind [`Html::parse_fragment`] recovers from any
/// malformed markup, so this never fails and never panics on bad input.
///
/// # Examples
///
/// ```
/// use libmdon::extract::extract_text;
///
/// assert_eq!(extract_text("<p>hello</p>"), "hello");
/// assert_eq!(extract_text("hello<br>world"), "hello\nworld");
/// ```
pub fn extract_text(html: &str) -> String {
    if !html.contains('<') {
        return html.to_string();
    }

    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());

    // (node, leaving): children are pushed in reverse so they pop left to right,
    // and the leaving marker sits below them so `br` is handled post-order.
    let mut stack = vec![(fragment.tree.root(), false)];

    while let Some((node, leaving)) = stack.pop() {
        if leaving {
            if let Node::Element(element) = node.value() {
                if element.name().eq_ignore_ascii_case("br") {
                    out.push('\n');
                }
            }
            continue;
        }

        if let Node::Text(text) = node.value() {
            let data = text.trim_matches(LINE_BREAKS);
            if !data.is_empty() {
                out.push_str(data);
            }
        }

        stack.push((node, true));
        for child in node.children().rev() {
            stack.push((child, false));
        }
    }

    out
}
