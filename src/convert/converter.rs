//! The recursive block converter.
//!
//! One depth-first walk over the normalized tree. Each element is
//! classified, then either emitted as a block (its own children converted
//! under a narrowed [`ConversionContext`]), walked through transparently,
//! skipped, or deferred to a marker. Inline runs between block children
//! become paragraphs; images inside inline content are hoisted to image
//! blocks right after the text they appeared in.

use super::classify::{
    classify, BlockDecision, BlockKind, CalloutStyle, ListItemKind, CALLOUT_TITLE_CLASSES,
};
use super::context::{ConversionContext, ExtractionContext, ListKind};
use super::markers::{splice, BlockSlot, DeferredBlockMap};
use super::order::OrderIndex;
use super::tables;
use crate::constants::{DEFAULT_CODE_LANGUAGE, MAX_RICH_TEXT_ITEMS};
use crate::dom::{ElementNode, SourceNode};
use crate::model::blocks::MediaSource;
use crate::model::Block;
use crate::rich_text::{build_inline_with, build_rich_text, coalesce, split_chars};
use crate::types::{Annotations, Diagnostics, Link, RichTextSpan, ValidatedUrl};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Output of a conversion: the block slots in document order and the
/// blocks parked behind their markers.
#[derive(Debug)]
pub struct Conversion {
    pub slots: Vec<BlockSlot>,
    pub markers: DeferredBlockMap,
}

/// Converts the children of `root` (the selected content region).
pub fn convert(root: &SourceNode, ectx: &mut ExtractionContext<'_>, order: &OrderIndex) -> Conversion {
    let mut converter = Converter {
        ectx,
        order,
        markers: DeferredBlockMap::new(),
    };
    let ctx = ConversionContext::new();
    let slots = match root {
        SourceNode::Element(element) => converter.convert_nodes(&element.children, &ctx),
        SourceNode::Text(_) => converter.convert_nodes(std::slice::from_ref(root), &ctx),
    };
    log::debug!(
        "Converted {} top-level slot(s), {} deferred group(s)",
        slots.len(),
        converter.markers.len()
    );
    Conversion {
        slots,
        markers: converter.markers,
    }
}

struct Converter<'c, 'a> {
    ectx: &'c mut ExtractionContext<'a>,
    order: &'c OrderIndex,
    markers: DeferredBlockMap,
}

impl Converter<'_, '_> {
    /// Converts a sibling sequence, grouping inline runs into paragraphs.
    fn convert_nodes(&mut self, nodes: &[SourceNode], ctx: &ConversionContext) -> Vec<BlockSlot> {
        let mut slots = Vec::new();
        let mut run_start = None;

        for (index, node) in nodes.iter().enumerate() {
            if is_inline_content(node) {
                run_start.get_or_insert(index);
                continue;
            }
            if let Some(start) = run_start.take() {
                slots.extend(self.inline_run(&nodes[start..index], Annotations::default()));
            }
            if let SourceNode::Element(element) = node {
                slots.extend(self.convert_element(element, ctx));
            }
        }
        if let Some(start) = run_start {
            slots.extend(self.inline_run(&nodes[start..], Annotations::default()));
        }
        slots
    }

    fn convert_element(&mut self, element: &ElementNode, ctx: &ConversionContext) -> Vec<BlockSlot> {
        if ctx.depth() >= self.ectx.config.max_depth {
            return self.flatten_too_deep(element, ctx);
        }
        match classify(element, ctx) {
            BlockDecision::Skip => Vec::new(),
            BlockDecision::Transparent => self.transparent(element, ctx),
            BlockDecision::Emit(kind) => self.emit(kind, element, ctx),
            BlockDecision::Defer(kind) => self.defer(kind, element, ctx),
        }
    }

    fn emit(&mut self, kind: BlockKind, element: &ElementNode, ctx: &ConversionContext) -> Vec<BlockSlot> {
        match kind {
            BlockKind::Paragraph => self.convert_nodes(&element.children, &ctx.descend()),
            BlockKind::Term => self.inline_run(&element.children, Annotations::bold()),
            BlockKind::Heading(level) => {
                let spans = build_rich_text(element, &self.ectx.inline());
                self.text_block(spans, &element.children, |spans| Block::heading(level, spans))
            }
            BlockKind::Quote => {
                let spans = build_rich_text(element, &self.ectx.inline().flattening());
                self.text_block(spans, &element.children, Block::quote)
            }
            BlockKind::ListItem(item) => self.list_item(item, element, ctx),
            BlockKind::Callout(style) => self.callout(style, element, ctx),
            BlockKind::VideoEmbed => self.video_embed(element, ctx),
            BlockKind::Code => self.code(element),
            BlockKind::Divider => vec![BlockSlot::leaf(Block::divider())],
            BlockKind::Image => self.image(element),
            BlockKind::Table => tables::convert_table(element, ctx, self.ectx, self.order)
                .into_iter()
                .map(BlockSlot::leaf)
                .collect(),
            BlockKind::TableRow => tables::convert_orphan_row(element, ctx, self.ectx, self.order)
                .into_iter()
                .map(BlockSlot::leaf)
                .collect(),
        }
    }

    fn transparent(&mut self, element: &ElementNode, ctx: &ConversionContext) -> Vec<BlockSlot> {
        if element.is_callout() && ctx.inside_callout() {
            return self.flattened_callout(element, ctx);
        }
        let inner = match element.tag.as_str() {
            "ol" => ctx.entering_list(ListKind::Numbered),
            "ul" | "menu" | "dir" => ctx.entering_list(ListKind::Bulleted),
            _ => ctx.descend(),
        };
        self.convert_nodes(&element.children, &inner)
    }

    /// Converts `element` as if it sat at the top level, parks the result
    /// and leaves a marker in its place.
    fn defer(&mut self, kind: BlockKind, element: &ElementNode, ctx: &ConversionContext) -> Vec<BlockSlot> {
        let slots = self.emit(kind, element, &ctx.lifted());
        let blocks = splice(slots, &mut self.markers, self.order, &mut self.ectx.diagnostics);
        if blocks.is_empty() {
            return Vec::new();
        }
        self.ectx.diagnostics.info(format!(
            "Moved <{}> out of {} to follow its top-level block",
            element.tag,
            ctx.location()
        ));
        vec![BlockSlot::Deferred(self.markers.insert(element.key, blocks))]
    }

    fn flatten_too_deep(&mut self, element: &ElementNode, ctx: &ConversionContext) -> Vec<BlockSlot> {
        self.ectx.diagnostics.warn_block(
            &ctx.location(),
            format!(
                "Markup nested deeper than {} levels under <{}>; flattened to text",
                self.ectx.config.max_depth, element.tag
            ),
        );
        let spans = build_rich_text(element, &self.ectx.inline().flattening());
        chunk_spans(spans)
            .into_iter()
            .map(|chunk| BlockSlot::leaf(Block::paragraph(chunk)))
            .collect()
    }

    /// Paragraphs for an inline run, followed by the images it contained.
    fn inline_run(&mut self, nodes: &[SourceNode], base: Annotations) -> Vec<BlockSlot> {
        let spans = build_inline_with(nodes, &self.ectx.inline(), base);
        let mut slots: Vec<BlockSlot> = chunk_spans(spans)
            .into_iter()
            .map(|chunk| BlockSlot::leaf(Block::paragraph(chunk)))
            .collect();
        slots.extend(self.hoisted_images(nodes));
        slots
    }

    /// A single text block; rich text past the item limit continues in
    /// paragraphs after it, then come the hoisted images.
    fn text_block<F>(&mut self, spans: Vec<RichTextSpan>, source: &[SourceNode], make: F) -> Vec<BlockSlot>
    where
        F: FnOnce(Vec<RichTextSpan>) -> Block,
    {
        let mut slots = Vec::new();
        if !spans.is_empty() {
            let (first, overflow) = split_first_chunk(spans);
            slots.push(BlockSlot::leaf(make(first)));
            slots.extend(overflow);
        }
        slots.extend(self.hoisted_images(source));
        slots
    }

    fn hoisted_images(&mut self, nodes: &[SourceNode]) -> Vec<BlockSlot> {
        let mut images = Vec::new();
        collect_images(nodes, &mut images);
        let config = self.ectx.config;
        images
            .into_iter()
            .filter_map(|img| {
                image_block(img, Vec::new(), config.base_url.as_ref(), &mut self.ectx.diagnostics)
            })
            .map(BlockSlot::leaf)
            .collect()
    }

    fn list_item(&mut self, kind: ListItemKind, element: &ElementNode, ctx: &ConversionContext) -> Vec<BlockSlot> {
        let item_ctx = ctx.entering_list_item();
        let inline = self.ectx.inline();
        let (lead, mut rest) = split_lead(&element.children);
        let mut spans = build_inline_with(lead, &inline, Annotations::default());
        let mut children = self.hoisted_images(lead);

        // An item that opens with a paragraph takes that paragraph's text.
        if spans.is_empty() {
            if let Some((SourceNode::Element(first), tail)) = rest.split_first() {
                if is_paragraph(first, &item_ctx) {
                    spans = build_rich_text(first, &inline);
                    children.extend(self.hoisted_images(&first.children));
                    rest = tail;
                }
            }
        }

        let (text, overflow) = split_first_chunk(spans);
        let mut child_slots = overflow;
        child_slots.extend(children);
        child_slots.extend(self.convert_nodes(rest, &item_ctx));

        let block = match kind {
            ListItemKind::Bulleted => Block::bulleted(text),
            ListItemKind::Numbered => Block::numbered(text),
            ListItemKind::ToDo { checked } => Block::to_do(text, checked),
        };
        vec![BlockSlot::with_children(block, child_slots)]
    }

    fn callout(&mut self, style: CalloutStyle, element: &ElementNode, ctx: &ConversionContext) -> Vec<BlockSlot> {
        let inner = ctx.entering_callout();
        let (rich_text, children) = self.callout_body(element, &inner, Annotations::default());
        let block = Block::callout(rich_text, Some(style.icon()), style.color);
        vec![BlockSlot::with_children(block, children)]
    }

    /// A callout inside a callout after the enclosing text was closed by a
    /// block: its text becomes a paragraph led by the bold title, and its
    /// blocks follow as siblings.
    fn flattened_callout(&mut self, element: &ElementNode, ctx: &ConversionContext) -> Vec<BlockSlot> {
        self.ectx.diagnostics.info(format!(
            "Flattened nested callout <{}> ({})",
            element.tag,
            ctx.location()
        ));
        let (rich_text, children) = self.callout_body(element, &ctx.descend(), Annotations::bold());
        let mut slots = Vec::with_capacity(children.len() + 1);
        if !rich_text.is_empty() {
            slots.push(BlockSlot::leaf(Block::paragraph(rich_text)));
        }
        slots.extend(children);
        slots
    }

    /// The rich text and child slots of a callout-like element.
    ///
    /// A leading title element contributes its text first, styled with
    /// `title_style`. When nothing but the title precedes the first block
    /// child and that child is a paragraph, the paragraph's text joins the
    /// callout text instead of becoming a child.
    fn callout_body(
        &mut self,
        element: &ElementNode,
        inner: &ConversionContext,
        title_style: Annotations,
    ) -> (Vec<RichTextSpan>, Vec<BlockSlot>) {
        let inline = self.ectx.inline();
        let mut body: &[SourceNode] = &element.children;
        let mut title = Vec::new();
        let mut separator = " ";

        if let Some(index) = leading_title(body) {
            if let SourceNode::Element(title_element) = &body[index] {
                title = build_inline_with(&title_element.children, &inline, title_style);
                if !title_element.is_inline() {
                    separator = "\n";
                }
            }
            body = &body[index + 1..];
        }

        let (lead, mut rest) = split_lead(body);
        let mut text = build_inline_with(lead, &inline, Annotations::default());
        let mut children = self.hoisted_images(lead);

        if text.is_empty() {
            if let Some((SourceNode::Element(first), tail)) = rest.split_first() {
                if is_paragraph(first, inner) {
                    text = build_rich_text(first, &inline);
                    children.extend(self.hoisted_images(&first.children));
                    rest = tail;
                }
            }
        }

        // While no block child has closed the text, a nested callout reads
        // as a bold lead-in inside it, and inline text after it continues it.
        let mut open = true;
        while open && inner.depth() < self.ectx.config.max_depth {
            let Some(index) = leading_callout(rest) else {
                break;
            };
            let SourceNode::Element(nested) = &rest[index] else {
                break;
            };
            self.ectx.diagnostics.info(format!(
                "Merged nested callout <{}> into the enclosing callout ({})",
                nested.tag,
                inner.location()
            ));
            let (lead_in, nested_children) =
                self.callout_body(nested, &inner.descend(), Annotations::bold());
            join_inline(&mut text, lead_in);
            open = nested_children.is_empty();
            children.extend(nested_children);
            rest = &rest[index + 1..];

            if open {
                let (lead, tail) = split_lead(rest);
                join_inline(&mut text, build_inline_with(lead, &inline, Annotations::default()));
                let images = self.hoisted_images(lead);
                open = images.is_empty();
                children.extend(images);
                rest = tail;
            }
        }

        let mut rich_text = title;
        if !rich_text.is_empty() && !text.is_empty() {
            rich_text.push(RichTextSpan::plain(separator));
        }
        rich_text.extend(text);
        let rich_text = coalesce(rich_text, self.ectx.config.max_span_len);

        let (first, overflow) = split_first_chunk(rich_text);
        let mut child_slots = overflow;
        child_slots.extend(children);
        child_slots.extend(self.convert_nodes(rest, inner));
        (first, child_slots)
    }

    /// Renders a video placeholder as a 🎥 callout: platform label, linked
    /// title and the thumbnail as a child image. Inside a callout it becomes
    /// a paragraph followed by the image.
    fn video_embed(&mut self, element: &ElementNode, ctx: &ConversionContext) -> Vec<BlockSlot> {
        let platform = element.attr("data-platform").unwrap_or("Embedded");
        let title = element
            .attr("data-title")
            .filter(|title| !title.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} video", platform));
        let link = element
            .attr("data-url")
            .and_then(|url| ValidatedUrl::resolve(self.ectx.config.base_url.as_ref(), url).ok())
            .map(|url| Link {
                url: url.as_str().to_string(),
            });

        let mut rich_text = vec![RichTextSpan::plain(format!("{} video: ", platform))];
        rich_text.extend(split_chars(&title, self.ectx.config.max_span_len).into_iter().map(
            |chunk| RichTextSpan {
                link: link.clone(),
                ..RichTextSpan::plain(chunk)
            },
        ));
        let rich_text = coalesce(rich_text, self.ectx.config.max_span_len);

        let thumbnail = element.attr("data-thumbnail").and_then(|src| {
            image_from_url(
                src,
                Vec::new(),
                self.ectx.config.base_url.as_ref(),
                &mut self.ectx.diagnostics,
            )
        });

        if ctx.inside_callout() {
            let mut slots = vec![BlockSlot::leaf(Block::paragraph(rich_text))];
            slots.extend(thumbnail.map(BlockSlot::leaf));
            return slots;
        }
        let style = CalloutStyle::VIDEO;
        let block = Block::callout(rich_text, Some(style.icon()), style.color);
        let children = thumbnail.map(BlockSlot::leaf).into_iter().collect();
        vec![BlockSlot::with_children(block, children)]
    }

    fn code(&mut self, element: &ElementNode) -> Vec<BlockSlot> {
        let text = code_text(element);
        if text.is_empty() {
            return Vec::new();
        }
        let language = detect_language(element);
        let spans: Vec<RichTextSpan> = split_chars(&text, self.ectx.config.max_span_len)
            .into_iter()
            .map(RichTextSpan::plain)
            .collect();
        if spans.len() > MAX_RICH_TEXT_ITEMS {
            self.ectx.diagnostics.warn_block(
                "code",
                format!("Code listing of {} characters split across several blocks", text.chars().count()),
            );
        }
        spans
            .chunks(MAX_RICH_TEXT_ITEMS)
            .map(|chunk| BlockSlot::leaf(Block::code(chunk.to_vec(), language)))
            .collect()
    }

    fn image(&mut self, element: &ElementNode) -> Vec<BlockSlot> {
        let config = self.ectx.config;
        let inline = self.ectx.inline();
        let (img, caption) = if element.tag == "img" {
            (Some(element), Vec::new())
        } else {
            let img = element.find_descendant(&|e: &ElementNode| e.tag == "img");
            let caption = element
                .find_descendant(&|e: &ElementNode| e.tag == "figcaption")
                .map(|figcaption| build_rich_text(figcaption, &inline))
                .unwrap_or_default();
            (img, caption)
        };
        let mut caption = caption;
        caption.truncate(MAX_RICH_TEXT_ITEMS);

        img.and_then(|img| image_block(img, caption, config.base_url.as_ref(), &mut self.ectx.diagnostics))
            .map(BlockSlot::leaf)
            .into_iter()
            .collect()
    }
}

/// Text nodes and inline elements that hold no block content.
fn is_inline_content(node: &SourceNode) -> bool {
    match node {
        SourceNode::Text(_) => true,
        SourceNode::Element(element) => element.is_inline() && !element.has_block_children(),
    }
}

/// Splits siblings into the leading inline run and the rest.
fn split_lead(nodes: &[SourceNode]) -> (&[SourceNode], &[SourceNode]) {
    let end = nodes
        .iter()
        .position(|node| !is_inline_content(node))
        .unwrap_or(nodes.len());
    nodes.split_at(end)
}

/// Index of a callout preceded by nothing but whitespace.
fn leading_callout(nodes: &[SourceNode]) -> Option<usize> {
    for (index, node) in nodes.iter().enumerate() {
        match node {
            SourceNode::Text(text) if text.content.trim().is_empty() => continue,
            SourceNode::Element(element) if element.is_callout() => return Some(index),
            _ => return None,
        }
    }
    None
}

/// Appends `more` to `text`, separated by a space unless either side
/// already supplies whitespace.
fn join_inline(text: &mut Vec<RichTextSpan>, more: Vec<RichTextSpan>) {
    let Some(first) = more.first() else {
        return;
    };
    let needs_space = text.last().is_some_and(|last| {
        !last.content.ends_with(char::is_whitespace)
            && !first.content.starts_with(char::is_whitespace)
    });
    if needs_space {
        text.push(RichTextSpan::plain(" "));
    }
    text.extend(more);
}

fn is_paragraph(element: &ElementNode, ctx: &ConversionContext) -> bool {
    classify(element, ctx) == BlockDecision::Emit(BlockKind::Paragraph)
}

/// Index of a title element preceded by nothing but whitespace.
fn leading_title(nodes: &[SourceNode]) -> Option<usize> {
    for (index, node) in nodes.iter().enumerate() {
        match node {
            SourceNode::Text(text) if text.content.trim().is_empty() => continue,
            SourceNode::Element(element)
                if element.has_any_class(CALLOUT_TITLE_CLASSES) && node.has_text() =>
            {
                return Some(index);
            }
            _ => return None,
        }
    }
    None
}

fn chunk_spans(spans: Vec<RichTextSpan>) -> Vec<Vec<RichTextSpan>> {
    spans
        .chunks(MAX_RICH_TEXT_ITEMS)
        .map(<[RichTextSpan]>::to_vec)
        .collect()
}

/// The first rich text chunk for the block itself and continuation
/// paragraphs for the rest.
fn split_first_chunk(spans: Vec<RichTextSpan>) -> (Vec<RichTextSpan>, Vec<BlockSlot>) {
    let mut chunks = chunk_spans(spans).into_iter();
    let first = chunks.next().unwrap_or_default();
    let overflow = chunks
        .map(|chunk| BlockSlot::leaf(Block::paragraph(chunk)))
        .collect();
    (first, overflow)
}

/// Every `<img>` under `nodes`, in document order.
pub(super) fn collect_images<'n>(nodes: &'n [SourceNode], out: &mut Vec<&'n ElementNode>) {
    for node in nodes {
        if let SourceNode::Element(element) = node {
            if element.tag == "img" {
                out.push(element);
            } else {
                collect_images(&element.children, out);
            }
        }
    }
}

/// An image block for an `<img>`, or `None` (with a diagnostic) when it
/// has no usable source.
pub(super) fn image_block(
    img: &ElementNode,
    caption: Vec<RichTextSpan>,
    base_url: Option<&ValidatedUrl>,
    diagnostics: &mut Diagnostics,
) -> Option<Block> {
    let src = img
        .attr("src")
        .or_else(|| img.attr("data-src"))
        .map(str::trim)
        .filter(|src| !src.is_empty());
    match src {
        Some(src) => image_from_url(src, caption, base_url, diagnostics),
        None => {
            diagnostics.warn_block("image", "Image without a source skipped");
            None
        }
    }
}

fn image_from_url(
    src: &str,
    caption: Vec<RichTextSpan>,
    base_url: Option<&ValidatedUrl>,
    diagnostics: &mut Diagnostics,
) -> Option<Block> {
    match ValidatedUrl::resolve(base_url, src) {
        Ok(url) => Some(Block::image(
            MediaSource::Unresolved {
                url: url.as_str().to_string(),
            },
            caption,
        )),
        Err(e) => {
            diagnostics.warn_block("image", format!("Image skipped: {}", e));
            None
        }
    }
}

/// Text of a code listing with its whitespace intact.
fn code_text(element: &ElementNode) -> String {
    fn walk(nodes: &[SourceNode], out: &mut String) {
        for node in nodes {
            match node {
                SourceNode::Text(text) => out.push_str(&text.content),
                SourceNode::Element(element) if element.tag == "br" => out.push('\n'),
                SourceNode::Element(element) => {
                    walk(&element.children, out);
                    if !element.is_inline() && !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
            }
        }
    }

    let mut out = String::new();
    walk(&element.children, &mut out);
    out.trim_start_matches(['\n', '\r'])
        .trim_end()
        .replace('\u{a0}', " ")
}

/// Languages Notion's code block accepts.
const NOTION_LANGUAGES: &[&str] = &[
    "bash", "c", "c#", "c++", "css", "diff", "docker", "go", "graphql", "groovy", "html", "java",
    "javascript", "json", "kotlin", "makefile", "markdown", "markup", "perl", "php", "plain text",
    "powershell", "python", "ruby", "rust", "scala", "shell", "sql", "swift", "typescript",
    "xml", "yaml",
];

static LANGUAGE_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("js", "javascript"),
        ("jsx", "javascript"),
        ("glide", "javascript"),
        ("servicenow", "javascript"),
        ("ts", "typescript"),
        ("py", "python"),
        ("sh", "shell"),
        ("zsh", "shell"),
        ("console", "shell"),
        ("ps", "powershell"),
        ("ps1", "powershell"),
        ("yml", "yaml"),
        ("md", "markdown"),
        ("htm", "html"),
        ("xhtml", "html"),
        ("cpp", "c++"),
        ("csharp", "c#"),
        ("cs", "c#"),
        ("golang", "go"),
        ("rb", "ruby"),
        ("rs", "rust"),
        ("dockerfile", "docker"),
        ("text", "plain text"),
        ("plaintext", "plain text"),
        ("txt", "plain text"),
        ("none", "plain text"),
    ])
});

/// Normalizes a source language hint to Notion's vocabulary.
fn normalize_language(hint: &str) -> Option<&'static str> {
    let hint = hint.trim().to_ascii_lowercase();
    if let Some(known) = NOTION_LANGUAGES.iter().find(|language| **language == hint) {
        return Some(known);
    }
    LANGUAGE_ALIASES.get(hint.as_str()).copied()
}

fn language_hint(element: &ElementNode) -> Option<&'static str> {
    let from_attr = ["data-language", "data-lang"]
        .iter()
        .find_map(|name| element.attr(name))
        .and_then(normalize_language);
    from_attr.or_else(|| {
        element.classes.iter().find_map(|class| {
            class
                .strip_prefix("language-")
                .or_else(|| class.strip_prefix("lang-"))
                .and_then(normalize_language)
        })
    })
}

/// Language of a code block, from the block or a nested `<code>`.
fn detect_language(element: &ElementNode) -> &'static str {
    language_hint(element)
        .or_else(|| {
            element
                .find_descendant(&|e: &ElementNode| e.tag == "code")
                .and_then(language_hint)
        })
        .unwrap_or(DEFAULT_CODE_LANGUAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;
    use crate::convert::markers::resolve_markers;
    use crate::dom::parse::parse_fragment;
    use crate::types::plain_text;
    use pretty_assertions::assert_eq;

    struct Output {
        blocks: Vec<Block>,
        diagnostics: Vec<crate::types::Diagnostic>,
    }

    fn convert_with(html: &str, config: &ExtractionConfig) -> Output {
        let mut ectx = ExtractionContext::new(config);
        let root = parse_fragment(html, &mut ectx.keys);
        let order = OrderIndex::build(Some(&root));
        let Conversion { slots, mut markers } = convert(&root, &mut ectx, &order);
        let blocks = resolve_markers(slots, &mut markers, &order, &mut ectx.diagnostics);
        Output {
            blocks,
            diagnostics: ectx.diagnostics.into_entries(),
        }
    }

    fn run(html: &str) -> Vec<Block> {
        convert_with(html, &ExtractionConfig::default()).blocks
    }

    fn types(blocks: &[Block]) -> Vec<&'static str> {
        blocks.iter().map(Block::block_type).collect()
    }

    fn text(block: &Block) -> String {
        plain_text(block.rich_text().unwrap_or_default())
    }

    #[test]
    fn callout_title_joins_the_text() {
        let blocks = run(
            r#"<div class="note"><span class="note__title">Note:</span> Some<b>thing</b> italic text</div>"#,
        );
        assert_eq!(blocks.len(), 1);
        let Block::Callout(callout) = &blocks[0] else {
            panic!("expected a callout");
        };
        assert_eq!(
            callout.content.rich_text,
            vec![
                RichTextSpan::plain("Note: Some"),
                RichTextSpan::styled("thing", Annotations::bold()),
                RichTextSpan::plain(" italic text"),
            ]
        );
        assert!(callout.common.children.is_empty());
    }

    #[test]
    fn callout_merges_its_first_paragraph() {
        let blocks = run(
            r#"<div class="note warning"><p class="tasklabel">Warning</p><p>Do not restart.</p><p>Second.</p></div>"#,
        );
        assert_eq!(types(&blocks), vec!["callout"]);
        assert_eq!(text(&blocks[0]), "Warning\nDo not restart.");
        assert_eq!(types(blocks[0].children()), vec!["paragraph"]);
    }

    #[test]
    fn table_in_list_item_moves_after_the_item() {
        let blocks = run(
            "<ul><li>Admin account in <span>GitHub</span>.<table><tr><td>a</td></tr></table></li><li>Next</li></ul>",
        );
        assert_eq!(types(&blocks), vec!["bulleted_list_item", "table", "bulleted_list_item"]);
        assert_eq!(text(&blocks[0]), "Admin account in GitHub.");
        assert!(blocks[0].children().is_empty());
    }

    #[test]
    fn nested_lists_keep_their_kind() {
        let blocks = run("<ol><li>one<ul><li>inner</li></ul></li><li><p>two</p></li></ol>");
        assert_eq!(types(&blocks), vec!["numbered_list_item", "numbered_list_item"]);
        assert_eq!(types(blocks[0].children()), vec!["bulleted_list_item"]);
        assert_eq!(text(&blocks[1]), "two");
        assert!(blocks[1].children().is_empty());
    }

    #[test]
    fn callouts_deep_in_lists_are_deferred() {
        let blocks = run(
            r#"<ul><li>outer<ul><li>inner<div class="note">Careful</div></li></ul></li></ul>"#,
        );
        assert_eq!(types(&blocks), vec!["bulleted_list_item", "callout"]);
        assert_eq!(text(&blocks[1]), "Careful");
    }

    #[test]
    fn shallow_callouts_stay_in_their_list_item() {
        let blocks = run(r#"<ul><li>item<div class="note">Careful</div></li></ul>"#);
        assert_eq!(types(&blocks), vec!["bulleted_list_item"]);
        assert_eq!(types(blocks[0].children()), vec!["callout"]);
    }

    #[test]
    fn nested_callouts_flatten() {
        let blocks = run(
            r#"<div class="note">Outer<div class="tip"><span class="title">Tip</span> inner</div></div>"#,
        );
        assert_eq!(types(&blocks), vec!["callout"]);
        assert!(blocks[0].children().is_empty());
        assert_eq!(
            blocks[0].rich_text().unwrap(),
            &[
                RichTextSpan::plain("Outer "),
                RichTextSpan::styled("Tip", Annotations::bold()),
                RichTextSpan::plain(" inner"),
            ]
        );
    }

    #[test]
    fn text_after_a_nested_callout_continues_the_outer_text() {
        let blocks = run(
            r#"<div class="warning"><div class="note"><span class="note__title">Note:</span> first</div> then more<ul><li>step</li></ul></div>"#,
        );
        assert_eq!(types(&blocks), vec!["callout"]);
        assert_eq!(text(&blocks[0]), "Note: first then more");
        assert_eq!(types(blocks[0].children()), vec!["bulleted_list_item"]);
    }

    #[test]
    fn nested_callout_blocks_follow_as_children_of_the_outer_callout() {
        let blocks = run(
            r#"<div class="note">Outer<div class="tip"><span class="title">Tip</span> inner<ul><li>a</li></ul></div><div class="important">Later</div></div>"#,
        );
        assert_eq!(types(&blocks), vec!["callout"]);
        assert_eq!(text(&blocks[0]), "Outer Tip inner");
        // the list closed the text, so the later callout flattens to a paragraph
        assert_eq!(
            types(blocks[0].children()),
            vec!["bulleted_list_item", "paragraph"]
        );
        assert_eq!(text(&blocks[0].children()[1]), "Later");
    }

    #[test]
    fn separate_sections_stay_separate() {
        let section = r#"<div class="section prereq"><p class="tasklabel">Before you begin</p><p>Role required: admin</p></div>"#;
        let blocks = run(&section.repeat(3));
        assert_eq!(types(&blocks), vec!["callout", "callout", "callout"]);
        for block in &blocks {
            assert_eq!(text(block), "Before you begin\nRole required: admin");
        }
    }

    #[test]
    fn mixed_content_groups_into_paragraphs_with_hoisted_images() {
        let blocks = run(
            r#"<div>Intro <img src="https://x.test/a.png"> text<p>Para</p>tail</div>"#,
        );
        assert_eq!(types(&blocks), vec!["paragraph", "image", "paragraph", "paragraph"]);
        assert_eq!(text(&blocks[0]), "Intro text");
        assert_eq!(text(&blocks[3]), "tail");
    }

    #[test]
    fn code_blocks_keep_whitespace_and_detect_language() {
        let blocks = run("<pre class=\"language-js\">if (a) {\n    b();\n}</pre>");
        let Block::Code(code) = &blocks[0] else {
            panic!("expected code");
        };
        assert_eq!(code.language, "javascript");
        assert_eq!(plain_text(&code.content.rich_text), "if (a) {\n    b();\n}");

        let blocks = run("<pre><code class=\"lang-cobol\">x</code></pre>");
        let Block::Code(code) = &blocks[0] else {
            panic!("expected code");
        };
        assert_eq!(code.language, DEFAULT_CODE_LANGUAGE);
    }

    #[test]
    fn figures_carry_their_caption() {
        let blocks = run(
            r#"<figure><img src="/img/flow.png"><figcaption>The <b>flow</b></figcaption></figure>"#,
        );
        let config = ExtractionConfig {
            base_url: ValidatedUrl::parse("https://docs.servicenow.com/bundle/page.html").ok(),
            ..ExtractionConfig::default()
        };
        // without a base URL the relative source cannot be resolved
        assert!(blocks.is_empty());

        let blocks = convert_with(
            r#"<figure><img src="/img/flow.png"><figcaption>The <b>flow</b></figcaption></figure>"#,
            &config,
        )
        .blocks;
        let Block::Image(image) = &blocks[0] else {
            panic!("expected an image");
        };
        assert_eq!(
            image.image,
            MediaSource::Unresolved {
                url: "https://docs.servicenow.com/img/flow.png".into()
            }
        );
        assert_eq!(plain_text(&image.caption), "The flow");
    }

    #[test]
    fn video_embeds_render_as_callouts() {
        let mut keys = crate::dom::KeyAllocator::new();
        let embed = ElementNode::new(keys.fresh(), "div")
            .with_class(crate::normalize::VIDEO_EMBED_CLASS)
            .with_attr("data-platform", "YouTube")
            .with_attr("data-title", "Intro")
            .with_attr("data-url", "https://www.youtube.com/watch?v=abc")
            .with_attr("data-thumbnail", "https://img.youtube.com/vi/abc/hqdefault.jpg");
        let root = ElementNode::new(keys.fresh(), "div")
            .with_children(vec![embed.into_node()])
            .into_node();

        let config = ExtractionConfig::default();
        let mut ectx = ExtractionContext::new(&config);
        let order = OrderIndex::build(Some(&root));
        let Conversion { slots, mut markers } = convert(&root, &mut ectx, &order);
        let blocks = resolve_markers(slots, &mut markers, &order, &mut ectx.diagnostics);

        let Block::Callout(callout) = &blocks[0] else {
            panic!("expected a callout");
        };
        assert_eq!(callout.content.color, crate::types::Color::PurpleBackground);
        assert_eq!(plain_text(&callout.content.rich_text), "YouTube video: Intro");
        assert_eq!(
            callout.content.rich_text[1].link.as_ref().map(|l| l.url.as_str()),
            Some("https://www.youtube.com/watch?v=abc")
        );
        assert_eq!(types(&callout.common.children), vec!["image"]);
    }

    #[test]
    fn long_paragraphs_split_at_the_item_limit() {
        let html: String = (0..150).map(|i| format!("<b>b{}</b><i>i{}</i>", i, i)).collect();
        let blocks = run(&format!("<p>{}</p>", html));
        assert_eq!(types(&blocks), vec!["paragraph", "paragraph", "paragraph"]);
        assert_eq!(blocks[0].rich_text().unwrap().len(), MAX_RICH_TEXT_ITEMS);
        assert_eq!(blocks[2].rich_text().unwrap().len(), 100);
    }

    #[test]
    fn depth_guard_flattens_with_a_diagnostic() {
        let config = ExtractionConfig {
            max_depth: 3,
            ..ExtractionConfig::default()
        };
        let html = "<div><div><div><div><div><p>deep</p><p>er</p></div></div></div></div></div>";
        let output = convert_with(html, &config);
        assert_eq!(types(&output.blocks), vec!["paragraph"]);
        assert_eq!(text(&output.blocks[0]), "deep\ner");
        assert_eq!(output.diagnostics.len(), 1);
    }

    #[test]
    fn definition_terms_are_bold() {
        let blocks = run("<dl><dt>Term</dt><dd>Meaning</dd></dl>");
        assert_eq!(
            blocks[0].rich_text().unwrap(),
            &[RichTextSpan::styled("Term", Annotations::bold())]
        );
        assert_eq!(text(&blocks[1]), "Meaning");
    }
}
