//! Turns emphasis expressed through classes into real emphasis tags.

use super::rewrite_tree;
use crate::dom::{ElementNode, KeyAllocator, SourceNode};

const BOLD_CLASSES: &[&str] = &["b", "bold", "strong"];
const ITALIC_CLASSES: &[&str] = &["i", "italic", "em"];

/// Retags inline elements carrying emphasis classes as `<strong>`/`<em>`.
///
/// Other classes and attributes survive on the retagged element. An element
/// with both kinds becomes `<strong><em>…</em></strong>`.
pub fn normalize_emphasis_classes(root: SourceNode, keys: &mut KeyAllocator) -> SourceNode {
    rewrite_tree(root, &mut |node| match node {
        SourceNode::Element(element) if element.is_inline() => vec![retag(element, keys)],
        other => vec![other],
    })
}

fn retag(mut element: ElementNode, keys: &mut KeyAllocator) -> SourceNode {
    let bold = element.has_any_class(BOLD_CLASSES);
    let italic = element.has_any_class(ITALIC_CLASSES);
    if !bold && !italic {
        return element.into_node();
    }

    element
        .classes
        .retain(|c| !BOLD_CLASSES.contains(&c.as_str()) && !ITALIC_CLASSES.contains(&c.as_str()));

    match (bold, italic) {
        (true, true) => {
            let inner = ElementNode::new(keys.fresh(), "em")
                .with_children(std::mem::take(&mut element.children));
            element.tag = "strong".to_string();
            element.children = vec![inner.into_node()];
        }
        (true, false) => element.tag = "strong".to_string(),
        _ => element.tag = "em".to_string(),
    }
    element.into_node()
}
