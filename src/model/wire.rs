//! Notion Blocks API wire format.
//!
//! The Notion API accepts blocks as `{ "type": T, T: { ... } }` objects with
//! rich text arrays of `{ type: "text", text: { content, link }, annotations }`.
//! This module is the only place that knows that shape.

use super::blocks::{Icon, MediaSource, TextBlockContent};
use super::Block;
use crate::types::RichTextSpan;
use serde_json::{json, Map, Value};

/// How much of the child tree to embed in a serialized block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildPolicy {
    /// Embed every descendant.
    Nested,
    /// Embed no children except table rows, which Notion requires at creation.
    Shallow,
}

impl Block {
    /// Serializes the block and all of its descendants.
    pub fn to_notion_json(&self) -> Value {
        self.to_notion_json_with(ChildPolicy::Nested)
    }

    pub fn to_notion_json_with(&self, policy: ChildPolicy) -> Value {
        let block_type = self.block_type();
        let mut payload = self.payload();

        let embed_children = match (self, policy) {
            (Block::Table(_), _) => true,
            (_, ChildPolicy::Nested) => self.has_children(),
            (_, ChildPolicy::Shallow) => false,
        };
        if embed_children {
            let children: Vec<Value> = self
                .children()
                .iter()
                .map(|child| child.to_notion_json_with(policy))
                .collect();
            payload.insert("children".to_string(), Value::Array(children));
        }

        let mut block = Map::new();
        block.insert("object".to_string(), json!("block"));
        block.insert("type".to_string(), json!(block_type));
        block.insert(block_type.to_string(), Value::Object(payload));
        Value::Object(block)
    }

    fn payload(&self) -> Map<String, Value> {
        let value = match self {
            Block::Paragraph(b) => text_payload(&b.content),
            Block::Heading1(b) => heading_payload(&b.content),
            Block::Heading2(b) => heading_payload(&b.content),
            Block::Heading3(b) => heading_payload(&b.content),
            Block::BulletedListItem(b) => text_payload(&b.content),
            Block::NumberedListItem(b) => text_payload(&b.content),
            Block::Quote(b) => text_payload(&b.content),
            Block::ToDo(b) => json!({
                "rich_text": rich_text_json(&b.content.rich_text),
                "checked": b.checked,
                "color": b.content.color.as_str(),
            }),
            Block::Callout(b) => {
                let mut value = text_payload(&b.content);
                if let (Some(icon), Value::Object(map)) = (&b.icon, &mut value) {
                    map.insert("icon".to_string(), icon_json(icon));
                }
                value
            }
            Block::Code(b) => json!({
                "rich_text": rich_text_json(&b.content.rich_text),
                "language": b.language,
                "caption": rich_text_json(&b.caption),
            }),
            Block::Divider(_) => json!({}),
            Block::Image(b) => {
                let mut value = media_json(&b.image);
                if let Value::Object(map) = &mut value {
                    map.insert("caption".to_string(), rich_text_json(&b.caption));
                }
                value
            }
            Block::Table(b) => json!({
                "table_width": b.table_width,
                "has_column_header": b.has_column_header,
                "has_row_header": b.has_row_header,
            }),
            Block::TableRow(b) => json!({
                "cells": b.cells.iter().map(|cell| rich_text_json(cell)).collect::<Vec<_>>(),
            }),
        };

        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

fn text_payload(content: &TextBlockContent) -> Value {
    json!({
        "rich_text": rich_text_json(&content.rich_text),
        "color": content.color.as_str(),
    })
}

fn heading_payload(content: &TextBlockContent) -> Value {
    json!({
        "rich_text": rich_text_json(&content.rich_text),
        "color": content.color.as_str(),
        "is_toggleable": false,
    })
}

pub fn icon_json(icon: &Icon) -> Value {
    match icon {
        Icon::Emoji { emoji } => json!({ "type": "emoji", "emoji": emoji }),
        Icon::External { url } => json!({ "type": "external", "external": { "url": url } }),
    }
}

fn media_json(source: &MediaSource) -> Value {
    match source {
        // An unresolved image is still a usable external reference.
        MediaSource::Unresolved { url } | MediaSource::External { url } => {
            json!({ "type": "external", "external": { "url": url } })
        }
        MediaSource::FileUpload { id } => {
            json!({ "type": "file_upload", "file_upload": { "id": id } })
        }
    }
}

/// Serializes a span sequence into a Notion `rich_text` array.
pub fn rich_text_json(spans: &[RichTextSpan]) -> Value {
    Value::Array(
        spans
            .iter()
            .map(|span| {
                let link = span
                    .link
                    .as_ref()
                    .map(|link| json!({ "url": link.url }))
                    .unwrap_or(Value::Null);
                json!({
                    "type": "text",
                    "text": { "content": span.content, "link": link },
                    "annotations": {
                        "bold": span.annotations.bold,
                        "italic": span.annotations.italic,
                        "strikethrough": span.annotations.strikethrough,
                        "underline": span.annotations.underline,
                        "code": span.annotations.code,
                        "color": span.annotations.color.as_str(),
                    },
                })
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Annotations, Color, Link};
    use pretty_assertions::assert_eq;

    #[test]
    fn paragraph_matches_notion_schema() {
        let mut span = RichTextSpan::styled("docs", Annotations::bold());
        span.link = Some(Link {
            url: "https://docs.servicenow.com".to_string(),
        });
        let block = Block::paragraph(vec![RichTextSpan::plain("See "), span]);

        assert_eq!(
            block.to_notion_json(),
            json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": {
                    "rich_text": [
                        {
                            "type": "text",
                            "text": { "content": "See ", "link": null },
                            "annotations": {
                                "bold": false, "italic": false, "strikethrough": false,
                                "underline": false, "code": false, "color": "default"
                            }
                        },
                        {
                            "type": "text",
                            "text": { "content": "docs", "link": { "url": "https://docs.servicenow.com" } },
                            "annotations": {
                                "bold": true, "italic": false, "strikethrough": false,
                                "underline": false, "code": false, "color": "default"
                            }
                        }
                    ],
                    "color": "default"
                }
            })
        );
    }

    #[test]
    fn shallow_policy_keeps_table_rows_only() {
        let mut item = Block::bulleted(vec![RichTextSpan::plain("item")]);
        item.children_mut().push(Block::paragraph(vec![]));
        let shallow = item.to_notion_json_with(ChildPolicy::Shallow);
        assert!(shallow["bulleted_list_item"].get("children").is_none());

        let table = Block::table(1, false, vec![Block::table_row(vec![vec![]])]);
        let shallow = table.to_notion_json_with(ChildPolicy::Shallow);
        assert_eq!(shallow["table"]["children"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn callout_carries_icon_and_color() {
        let block = Block::callout(
            vec![RichTextSpan::plain("Note:")],
            Some(Icon::emoji("ℹ️")),
            Color::BlueBackground,
        );
        let value = block.to_notion_json();
        assert_eq!(value["callout"]["icon"]["emoji"], "ℹ️");
        assert_eq!(value["callout"]["color"], "blue_background");
    }

    #[test]
    fn images_serialize_by_source() {
        let upload = Block::image(
            MediaSource::FileUpload {
                id: "upload-1".to_string(),
            },
            vec![],
        );
        assert_eq!(upload.to_notion_json()["image"]["file_upload"]["id"], "upload-1");

        let unresolved = Block::image(
            MediaSource::Unresolved {
                url: "https://example.com/a.png".to_string(),
            },
            vec![],
        );
        assert_eq!(unresolved.to_notion_json()["image"]["type"], "external");
    }
}
