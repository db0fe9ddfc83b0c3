//! Rich text building: inline markup to Notion rich text spans.
//!
//! The builder walks inline content depth-first, pushing annotations as it
//! descends. Leaves are whitespace-collapsed the way a browser renders them,
//! role names after "Role required:" are marked, adjacent leaves with the
//! same style are coalesced, and over-long runs are split.

pub mod annotations;
mod html;
mod roles;

pub use html::spans_to_html;
pub use roles::is_role_name;

use crate::constants::MAX_RICH_TEXT_LENGTH;
use crate::dom::{ElementNode, SourceNode};
use crate::types::{Annotations, Link, RichTextSpan, ValidatedUrl};

/// Ambient settings for one rich text build.
#[derive(Debug, Clone, Copy)]
pub struct InlineContext<'a> {
    /// Base URL relative links resolve against.
    pub base_url: Option<&'a ValidatedUrl>,
    /// Longest content a single span may carry.
    pub max_span_len: usize,
    /// Walk block-level descendants too, separating them with line breaks.
    pub flatten_blocks: bool,
}

impl<'a> InlineContext<'a> {
    pub fn new(base_url: Option<&'a ValidatedUrl>) -> Self {
        Self {
            base_url,
            max_span_len: MAX_RICH_TEXT_LENGTH,
            flatten_blocks: false,
        }
    }

    pub fn flattening(self) -> Self {
        Self {
            flatten_blocks: true,
            ..self
        }
    }
}

/// Elements whose content never renders as text.
const IGNORED_TAGS: &[&str] = &[
    "img", "script", "style", "noscript", "template", "input", "button", "iframe", "video",
    "svg", "head",
];

/// A run of text with one style, before coalescing and splitting.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Piece {
    pub text: String,
    pub annotations: Annotations,
    pub link: Option<Link>,
}

#[derive(Debug, Clone)]
enum Leaf {
    Text(Piece),
    Break,
}

/// Builds the rich text of an element's inline content.
pub fn build_rich_text(element: &ElementNode, ctx: &InlineContext<'_>) -> Vec<RichTextSpan> {
    build_inline(&element.children, ctx)
}

/// Builds rich text from a run of sibling nodes.
pub fn build_inline(nodes: &[SourceNode], ctx: &InlineContext<'_>) -> Vec<RichTextSpan> {
    build_inline_with(nodes, ctx, Annotations::default())
}

/// Like [`build_inline`], with annotations already in effect.
pub fn build_inline_with(
    nodes: &[SourceNode],
    ctx: &InlineContext<'_>,
    base: Annotations,
) -> Vec<RichTextSpan> {
    let mut leaves = Vec::new();
    collect_leaves(nodes, ctx, base, None, &mut leaves);
    let pieces = collapse_whitespace(leaves);
    let pieces = roles::mark_role_names(pieces);
    finish(pieces, ctx.max_span_len)
}

fn collect_leaves(
    nodes: &[SourceNode],
    ctx: &InlineContext<'_>,
    annotations: Annotations,
    link: Option<&Link>,
    leaves: &mut Vec<Leaf>,
) {
    for node in nodes {
        match node {
            SourceNode::Text(text) => leaves.push(Leaf::Text(Piece {
                text: text.content.clone(),
                annotations,
                link: link.cloned(),
            })),
            SourceNode::Element(element) => {
                if element.tag == "br" {
                    leaves.push(Leaf::Break);
                    continue;
                }
                if IGNORED_TAGS.contains(&element.tag.as_str()) {
                    continue;
                }
                if !element.is_inline() {
                    if !ctx.flatten_blocks {
                        continue;
                    }
                    leaves.push(Leaf::Break);
                    collect_leaves(&element.children, ctx, annotations, link, leaves);
                    leaves.push(Leaf::Break);
                    continue;
                }

                let inner = annotations::apply_element(element, annotations);
                let anchor = if element.tag == "a" {
                    resolve_link(element, ctx)
                } else {
                    None
                };
                let link = anchor.as_ref().or(link);
                collect_leaves(&element.children, ctx, inner, link, leaves);
            }
        }
    }
}

fn resolve_link(anchor: &ElementNode, ctx: &InlineContext<'_>) -> Option<Link> {
    let href = anchor.attr("href")?.trim();
    if href.is_empty() || href.starts_with('#') || href.to_ascii_lowercase().starts_with("javascript:")
    {
        return None;
    }
    match ValidatedUrl::resolve(ctx.base_url, href) {
        Ok(url) => Some(Link {
            url: url.as_str().to_string(),
        }),
        Err(e) => {
            log::debug!("Dropping unresolvable link '{}': {}", href, e);
            None
        }
    }
}

/// Collapses whitespace runs to one space, trims around line breaks and at
/// both ends, and drops empty pieces.
///
/// The collapsed space stays in the leaf where the run started, as a
/// browser renders it.
fn collapse_whitespace(leaves: Vec<Leaf>) -> Vec<Piece> {
    let mut out: Vec<Piece> = Vec::new();
    let mut after_space = true;

    for leaf in leaves {
        match leaf {
            Leaf::Break => {
                trim_trailing_space(&mut out);
                if out.last().map_or(true, |p| p.text.ends_with('\n')) {
                    // no blank lines, no leading break
                    continue;
                }
                if let Some(last) = out.last_mut() {
                    last.text.push('\n');
                }
                after_space = true;
            }
            Leaf::Text(piece) => {
                let mut text = String::with_capacity(piece.text.len());
                for c in piece.text.chars() {
                    if c.is_whitespace() {
                        if !after_space {
                            text.push(' ');
                            after_space = true;
                        }
                        continue;
                    }
                    text.push(c);
                    after_space = false;
                }
                if !text.is_empty() {
                    out.push(Piece { text, ..piece });
                }
            }
        }
    }

    trim_trailing_space(&mut out);
    while let Some(last) = out.last_mut() {
        if last.text.ends_with('\n') {
            last.text.pop();
        }
        if !last.text.is_empty() {
            break;
        }
        out.pop();
    }
    out
}

fn trim_trailing_space(out: &mut Vec<Piece>) {
    while let Some(last) = out.last_mut() {
        if last.text.ends_with(' ') {
            last.text.pop();
        }
        if !last.text.is_empty() {
            break;
        }
        out.pop();
    }
}

/// Coalesces same-style neighbours, then splits over-long content.
fn finish(pieces: Vec<Piece>, max_len: usize) -> Vec<RichTextSpan> {
    let mut merged: Vec<Piece> = Vec::with_capacity(pieces.len());
    for piece in pieces {
        match merged.last_mut() {
            Some(last) if last.annotations == piece.annotations && last.link == piece.link => {
                last.text.push_str(&piece.text);
            }
            _ => merged.push(piece),
        }
    }

    let max_len = max_len.max(1);
    let mut spans = Vec::with_capacity(merged.len());
    for piece in merged {
        for chunk in split_chars(&piece.text, max_len) {
            spans.push(RichTextSpan {
                content: chunk,
                annotations: piece.annotations,
                link: piece.link.clone(),
            });
        }
    }
    spans
}

/// Splits `text` into chunks of at most `max_len` characters.
pub fn split_chars(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;
    for c in text.chars() {
        if count == max_len {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(c);
        count += 1;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Re-applies the coalescing rule to an arbitrary span sequence.
///
/// Used when spans from different builds are concatenated, e.g. a callout
/// title followed by the callout body.
pub fn coalesce(spans: Vec<RichTextSpan>, max_len: usize) -> Vec<RichTextSpan> {
    let pieces = spans
        .into_iter()
        .filter(|span| !span.content.is_empty())
        .map(|span| Piece {
            text: span.content,
            annotations: span.annotations,
            link: span.link,
        })
        .collect();
    finish(pieces, max_len)
}
