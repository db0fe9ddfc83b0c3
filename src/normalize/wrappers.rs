//! Unwraps presentational wrapper elements.

use super::rewrite_tree;
use crate::dom::{ElementNode, SourceNode};

const WRAPPER_CLASSES: &[&str] = &["itemgroup", "info"];

fn is_wrapper(element: &ElementNode) -> bool {
    !element.is_inline() && element.has_any_class(WRAPPER_CLASSES) && !element.is_callout()
}

/// Splices the children of wrapper elements into their parent.
pub fn unwrap_wrappers(root: SourceNode) -> SourceNode {
    rewrite_tree(root, &mut |node| match node {
        SourceNode::Element(element) if is_wrapper(&element) => element.children,
        other => vec![other],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse::parse_fragment;
    use crate::dom::KeyAllocator;

    fn top_tags(html: &str) -> Vec<String> {
        let mut keys = KeyAllocator::new();
        let root = unwrap_wrappers(parse_fragment(html, &mut keys));
        root.as_element()
            .unwrap()
            .child_elements()
            .map(|e| e.tag.clone())
            .collect()
    }

    #[test]
    fn wrappers_are_spliced() {
        assert_eq!(
            top_tags(r#"<div class="itemgroup info"><p>a</p><ul><li>b</li></ul></div>"#),
            vec!["p", "ul"]
        );
    }

    #[test]
    fn callouts_are_never_unwrapped() {
        assert_eq!(top_tags(r#"<div class="note info"><p>a</p></div>"#), vec!["div"]);
    }

    #[test]
    fn nested_wrappers_collapse() {
        assert_eq!(
            top_tags(r#"<div class="itemgroup"><div class="info"><p>a</p></div></div>"#),
            vec!["p"]
        );
    }
}
