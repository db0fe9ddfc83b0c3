// src/analytics/mod.rs
//! Content counts for the source tree and the produced blocks.
//!
//! The report compares what the page contained with what the conversion
//! produced; a lower block count than source count is recorded as an error.

use crate::convert::classify::{is_table_like, is_video_embed};
use crate::dom::{ElementNode, SourceNode};
use crate::model::{
    walk_blocks, Block, BlockVisitor, CalloutBlock, ImageBlock, TableBlock, TextBlockContent,
    ToDoBlock,
};
use serde::Serialize;

/// Element and block counts for one content kind each.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContentCounts {
    pub tables: usize,
    pub images: usize,
    pub list_items: usize,
    pub callouts: usize,
}

/// Source counts next to block counts, plus any shortfalls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub source: ContentCounts,
    pub notion: ContentCounts,
    pub errors: Vec<String>,
    pub has_errors: bool,
}

/// Counts content in `source` and in `blocks` and compares the two.
pub fn validate(source: &SourceNode, blocks: &[Block]) -> ValidationReport {
    let mut source_counts = ContentCounts::default();
    if let Some(root) = source.as_element() {
        count_source(root, false, false, &mut source_counts);
    }

    let mut counter = BlockCounter::default();
    walk_blocks(blocks, &mut counter);
    let notion = counter.counts;

    let mut errors = Vec::new();
    for (kind, expected, actual) in [
        ("table", source_counts.tables, notion.tables),
        ("image", source_counts.images, notion.images),
        ("list item", source_counts.list_items, notion.list_items),
        ("callout", source_counts.callouts, notion.callouts),
    ] {
        if actual < expected {
            errors.push(format!(
                "Expected {} {}(s), found {} in converted blocks",
                expected, kind, actual
            ));
        }
    }

    ValidationReport {
        source: source_counts,
        notion,
        has_errors: !errors.is_empty(),
        errors,
    }
}

fn count_source(element: &ElementNode, in_table: bool, in_callout: bool, counts: &mut ContentCounts) {
    let table = is_table_like(element);
    let callout = element.is_callout() || is_video_embed(element);

    if table && !in_table {
        counts.tables += 1;
    }
    if callout && !in_callout {
        counts.callouts += 1;
    }
    match element.tag.as_str() {
        "img" => counts.images += 1,
        "li" => counts.list_items += 1,
        _ => {}
    }

    for child in element.child_elements() {
        count_source(child, in_table || table, in_callout || callout, counts);
    }
}

#[derive(Default)]
struct BlockCounter {
    counts: ContentCounts,
}

impl BlockVisitor for BlockCounter {
    type Output = ();

    fn visit_bulleted_list_item(&mut self, _content: &TextBlockContent) {
        self.counts.list_items += 1;
    }

    fn visit_numbered_list_item(&mut self, _content: &TextBlockContent) {
        self.counts.list_items += 1;
    }

    fn visit_todo(&mut self, _todo: &ToDoBlock) {
        self.counts.list_items += 1;
    }

    fn visit_callout(&mut self, _callout: &CalloutBlock) {
        self.counts.callouts += 1;
    }

    fn visit_image(&mut self, _image: &ImageBlock) {
        self.counts.images += 1;
    }

    fn visit_table(&mut self, _table: &TableBlock) {
        self.counts.tables += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse::parse_fragment;
    use crate::dom::KeyAllocator;
    use crate::model::blocks::MediaSource;
    use crate::types::RichTextSpan;
    use pretty_assertions::assert_eq;

    fn source(html: &str) -> SourceNode {
        parse_fragment(html, &mut KeyAllocator::new())
    }

    #[test]
    fn matching_counts_produce_no_errors() {
        let root = source(
            r#"<ul><li>one</li><li>two</li></ul>
               <div class="note">Careful</div>
               <table><tr><td>a</td></tr></table>"#,
        );
        let blocks = vec![
            Block::bulleted(vec![RichTextSpan::plain("one")]),
            Block::bulleted(vec![RichTextSpan::plain("two")]),
            Block::callout(vec![RichTextSpan::plain("Careful")], None, Default::default()),
            Block::table(1, false, vec![Block::table_row(vec![vec![RichTextSpan::plain("a")]])]),
        ];

        let report = validate(&root, &blocks);
        assert_eq!(
            report.source,
            ContentCounts {
                tables: 1,
                images: 0,
                list_items: 2,
                callouts: 1,
            }
        );
        assert_eq!(report.notion, report.source);
        assert!(!report.has_errors);
    }

    #[test]
    fn missing_images_are_reported() {
        let root = source(r#"<p><img src="a.png"><img src="b.png"></p>"#);
        let blocks = vec![Block::image(
            MediaSource::External {
                url: "https://example.com/a.png".into(),
            },
            vec![],
        )];

        let report = validate(&root, &blocks);
        assert!(report.has_errors);
        assert_eq!(report.errors, vec!["Expected 2 image(s), found 1 in converted blocks"]);
    }

    #[test]
    fn nested_callouts_and_tables_count_once() {
        let root = source(
            r#"<div class="warning">outer<div class="note">inner</div></div>
               <table><tr><td><table><tr><td>x</td></tr></table></td></tr></table>"#,
        );
        let report = validate(&root, &[]);
        assert_eq!(report.source.callouts, 1);
        assert_eq!(report.source.tables, 1);
    }
}
