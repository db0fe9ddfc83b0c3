//! Converts literal markdown emphasis left in text into emphasis elements.
//!
//! Bold (`**x**`) is converted before italic (`_x_`, `*x*`) so the italic
//! patterns never see the double asterisks.

use crate::dom::{ElementNode, KeyAllocator, SourceNode};
use once_cell::sync::Lazy;
use regex::Regex;

/// Text under these elements is taken literally.
const LITERAL_ANCESTORS: &[&str] = &[
    "a", "code", "pre", "kbd", "samp", "tt", "var", "em", "strong", "b", "i", "script", "style",
    "textarea",
];

static BOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*([^*\n]+?)\*\*").expect("valid bold regex"));
static ITALIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"_([^_\s](?:[^_\n]*[^_\s])?)_|\*([^*\s](?:[^*\n]*[^*\s])?)\*")
        .expect("valid italic regex")
});

/// Characters before an opening delimiter that glue it to a URL, path or
/// identifier.
fn glued_before(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '/' | '\\' | ':' | '.' | '-' | '_' | '*' | '=' | '?' | '&')
}

/// Characters after a closing delimiter that glue it to the next token.
/// Sentence punctuation is allowed.
fn glued_after(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '/' | '\\' | '_' | '*' | '=')
}

pub fn convert_markdown_emphasis(root: SourceNode, keys: &mut KeyAllocator) -> SourceNode {
    let root = apply(root, &BOLD, "strong", keys, false);
    apply(root, &ITALIC, "em", keys, false)
}

fn apply(
    node: SourceNode,
    pattern: &Regex,
    tag: &str,
    keys: &mut KeyAllocator,
    literal: bool,
) -> SourceNode {
    match node {
        SourceNode::Element(mut element) => {
            let literal = literal || LITERAL_ANCESTORS.contains(&element.tag.as_str());
            let children = std::mem::take(&mut element.children);
            element.children = children
                .into_iter()
                .flat_map(|child| match child {
                    SourceNode::Text(text) if !literal => {
                        split_text(&text.content, pattern, tag, keys)
                            .unwrap_or_else(|| vec![SourceNode::Text(text)])
                    }
                    other => vec![apply(other, pattern, tag, keys, literal)],
                })
                .collect();
            SourceNode::Element(element)
        }
        text => text,
    }
}

/// Splits `text` around every unglued match; `None` when nothing matched.
fn split_text(
    text: &str,
    pattern: &Regex,
    tag: &str,
    keys: &mut KeyAllocator,
) -> Option<Vec<SourceNode>> {
    let mut out = Vec::new();
    let mut cursor = 0;

    for captures in pattern.captures_iter(text) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        let Some(inner) = captures.iter().skip(1).flatten().next() else {
            continue;
        };
        let before = text[..whole.start()].chars().next_back();
        let after = text[whole.end()..].chars().next();
        if before.is_some_and(glued_before) || after.is_some_and(glued_after) || whole.start() < cursor {
            continue;
        }

        if whole.start() > cursor {
            out.push(SourceNode::text(keys.fresh(), &text[cursor..whole.start()]));
        }
        let emphasis = ElementNode::new(keys.fresh(), tag)
            .with_children(vec![SourceNode::text(keys.fresh(), inner.as_str())]);
        out.push(emphasis.into_node());
        cursor = whole.end();
    }

    if out.is_empty() {
        return None;
    }
    if cursor < text.len() {
        out.push(SourceNode::text(keys.fresh(), &text[cursor..]));
    }
    Some(out)
}
