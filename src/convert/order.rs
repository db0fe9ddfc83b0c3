//! Document-order index over the normalized source tree.

use crate::dom::{NodeKey, SourceNode};
use std::collections::HashMap;

/// Pre-order rank of every node in a tree.
#[derive(Debug, Clone, Default)]
pub struct OrderIndex {
    positions: HashMap<NodeKey, usize>,
}

impl OrderIndex {
    /// Indexes `root` depth-first, parents before children, starting at 0.
    /// A key seen twice keeps its first position.
    pub fn build(root: Option<&SourceNode>) -> Self {
        let mut index = Self::default();
        if let Some(root) = root {
            index.visit(root);
        }
        index
    }

    fn visit(&mut self, node: &SourceNode) {
        let next = self.positions.len();
        self.positions.entry(node.key()).or_insert(next);
        if let SourceNode::Element(element) = node {
            for child in &element.children {
                self.visit(child);
            }
        }
    }

    /// Position of `key`, or `usize::MAX` when it was never indexed.
    pub fn position(&self, key: NodeKey) -> usize {
        self.positions.get(&key).copied().unwrap_or(usize::MAX)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Stable sort of items by the document position of their key; unindexed
/// keys go last.
pub fn sort_by_key_order<T, F>(items: &mut [T], index: &OrderIndex, key_of: F)
where
    F: Fn(&T) -> NodeKey,
{
    items.sort_by_key(|item| index.position(key_of(item)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse::parse_fragment;
    use crate::dom::KeyAllocator;

    #[test]
    fn preorder_positions() {
        let mut keys = KeyAllocator::new();
        let root = parse_fragment("<p>a<b>b</b></p><p>c</p>", &mut keys);
        let index = OrderIndex::build(Some(&root));

        let element = root.as_element().unwrap();
        let first = &element.children[0];
        let second = &element.children[1];
        assert_eq!(index.position(root.key()), 0);
        assert_eq!(index.position(first.key()), 1);
        assert!(index.position(second.key()) > index.position(first.key()) + 2);
        assert_eq!(index.len(), 7);
    }

    #[test]
    fn unindexed_sort_last() {
        let mut keys = KeyAllocator::new();
        let root = parse_fragment("<p>a</p><p>b</p>", &mut keys);
        let index = OrderIndex::build(Some(&root));
        let stray = SourceNode::text(keys.fresh(), "stray");
        assert_eq!(index.position(stray.key()), usize::MAX);

        let element = root.as_element().unwrap();
        let mut nodes = vec![&stray, &element.children[1], &element.children[0]];
        sort_by_key_order(&mut nodes, &index, |node| node.key());
        assert_eq!(nodes[0].text_content(), "a");
        assert_eq!(nodes[1].text_content(), "b");
        assert_eq!(nodes[2].text_content(), "stray");
    }

    #[test]
    fn empty_tree() {
        assert!(OrderIndex::build(None).is_empty());
    }
}
