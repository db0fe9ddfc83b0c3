//! Table caption recovery.
//!
//! ServiceNow emits table titles either as a `<caption>` inside the table or
//! as a `span.title` / `p.title` / `div.tablecap` just before it. Both become
//! an `h3.table-caption` placed immediately before the table.

use super::rewrite_tree;
use crate::dom::{ElementNode, KeyAllocator, NodeKey, SourceNode};

pub const TABLE_CAPTION_CLASS: &str = "table-caption";

pub fn recover_table_captions(root: SourceNode, keys: &mut KeyAllocator) -> SourceNode {
    rewrite_tree(root, &mut |node| match node {
        SourceNode::Element(mut element) => {
            element.children = relocate_captions(std::mem::take(&mut element.children), keys);
            vec![SourceNode::Element(element)]
        }
        text => vec![text],
    })
}

fn is_table(node: &SourceNode) -> bool {
    node.is_element("table")
}

fn is_title_element(element: &ElementNode) -> bool {
    match element.tag.as_str() {
        "span" | "p" => element.has_class("title"),
        "div" => element.has_class("tablecap"),
        _ => false,
    }
}

fn caption_heading(key: NodeKey, children: Vec<SourceNode>) -> SourceNode {
    ElementNode::new(key, "h3")
        .with_class(TABLE_CAPTION_CLASS)
        .with_children(children)
        .into_node()
}

fn relocate_captions(children: Vec<SourceNode>, keys: &mut KeyAllocator) -> Vec<SourceNode> {
    let mut out: Vec<SourceNode> = Vec::with_capacity(children.len());

    for child in children {
        if !is_table(&child) {
            out.push(child);
            continue;
        }
        let SourceNode::Element(mut table) = child else {
            continue;
        };

        // A sibling title directly before the table, ignoring whitespace.
        let title_index = out
            .iter()
            .rposition(|n| !matches!(n, SourceNode::Text(t) if t.content.trim().is_empty()))
            .filter(|&i| matches!(&out[i], SourceNode::Element(e) if is_title_element(e)));
        let mut captioned = false;
        if let Some(index) = title_index {
            if let SourceNode::Element(title) = out.remove(index) {
                out.truncate(index);
                out.push(caption_heading(title.key, title.children));
                captioned = true;
            }
        }

        // An inner <caption> is always removed; it only becomes the heading
        // when no sibling title already did.
        if let Some(position) = table.children.iter().position(|n| n.is_element("caption")) {
            if let SourceNode::Element(caption) = table.children.remove(position) {
                if !captioned && caption.children.iter().any(SourceNode::has_text) {
                    out.push(caption_heading(keys.fresh(), caption.children));
                }
            }
        }

        out.push(SourceNode::Element(table));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse::parse_fragment;

    fn shape(html: &str) -> Vec<(String, String)> {
        let mut keys = KeyAllocator::new();
        let root = recover_table_captions(parse_fragment(html, &mut keys), &mut keys);
        root.as_element()
            .unwrap()
            .child_elements()
            .map(|e| (e.tag.clone(), e.text_content().trim().to_string()))
            .collect()
    }

    #[test]
    fn inner_caption_moves_before_table() {
        let result = shape("<table><caption>Roles</caption><tr><td>a</td></tr></table>");
        assert_eq!(result[0], ("h3".to_string(), "Roles".to_string()));
        assert_eq!(result[1].0, "table");
        assert!(!result[1].1.contains("Roles"));
    }

    #[test]
    fn preceding_title_is_retagged() {
        let result = shape(
            r#"<p>Intro</p><span class="title">Table 1. Fields</span>
               <table><tr><td>a</td></tr></table>"#,
        );
        let tags: Vec<&str> = result.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tags, vec!["p", "h3", "table"]);
        assert_eq!(result[1].1, "Table 1. Fields");
    }

    #[test]
    fn unrelated_titles_are_left_alone() {
        let result = shape(r#"<span class="title">Heading</span><p>Text</p>"#);
        assert_eq!(result[0].0, "span");
    }
}
