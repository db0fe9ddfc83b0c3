//! Deferred blocks: content converted away from an illegal position and
//! spliced back in as a top-level sibling.
//!
//! While converting, a block that cannot live where it was found (a table in
//! a list item, a callout three lists deep) is converted on its own and
//! parked in a [`DeferredBlockMap`]; its old position keeps a
//! [`BlockSlot::Deferred`] marker. [`resolve_markers`] then strips every
//! marker and reinserts the parked blocks right after the top-level block
//! that owned the marker.

use super::order::{sort_by_key_order, OrderIndex};
use crate::dom::NodeKey;
use crate::model::Block;
use crate::types::{Diagnostics, MarkerId};
use indexmap::IndexMap;

/// A converted block, or a marker standing in for deferred content.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockSlot {
    Real {
        block: Block,
        children: Vec<BlockSlot>,
    },
    Deferred(MarkerId),
}

impl BlockSlot {
    pub fn leaf(block: Block) -> Self {
        BlockSlot::Real {
            block,
            children: Vec::new(),
        }
    }

    pub fn with_children(block: Block, children: Vec<BlockSlot>) -> Self {
        BlockSlot::Real { block, children }
    }
}

/// Blocks parked under one marker.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredEntry {
    /// The element the blocks were converted from; orders the splice.
    pub source: NodeKey,
    pub blocks: Vec<Block>,
}

/// Parked blocks keyed by marker, in the order they were deferred.
#[derive(Debug, Default)]
pub struct DeferredBlockMap {
    entries: IndexMap<MarkerId, DeferredEntry>,
}

impl DeferredBlockMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks `blocks` and returns the marker that stands for them.
    pub fn insert(&mut self, source: NodeKey, blocks: Vec<Block>) -> MarkerId {
        let id = MarkerId::fresh();
        self.entries
            .insert(id.clone(), DeferredEntry { source, blocks });
        id
    }

    pub fn remove(&mut self, id: &MarkerId) -> Option<DeferredEntry> {
        self.entries.shift_remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn drain(&mut self) -> Vec<DeferredEntry> {
        self.entries.drain(..).map(|(_, entry)| entry).collect()
    }
}

/// Strips all markers from `slots` and splices their entries in as top-level
/// siblings. Entries never referenced from `slots` are appended at the end,
/// so the map is always empty afterwards.
pub fn resolve_markers(
    slots: Vec<BlockSlot>,
    markers: &mut DeferredBlockMap,
    order: &OrderIndex,
    diagnostics: &mut Diagnostics,
) -> Vec<Block> {
    let mut blocks = splice(slots, markers, order, diagnostics);

    let mut orphans = markers.drain();
    if !orphans.is_empty() {
        diagnostics.warn(format!(
            "{} deferred block group(s) had no marker; appended at the end",
            orphans.len()
        ));
        sort_by_key_order(&mut orphans, order, |entry| entry.source);
        blocks.extend(orphans.into_iter().flat_map(|entry| entry.blocks));
    }
    blocks
}

/// Materializes `slots`, placing each marker's entry after the top-level
/// block whose subtree held the marker.
///
/// Entries referenced from elsewhere stay in the map.
pub(crate) fn splice(
    slots: Vec<BlockSlot>,
    markers: &mut DeferredBlockMap,
    order: &OrderIndex,
    diagnostics: &mut Diagnostics,
) -> Vec<Block> {
    let mut out = Vec::with_capacity(slots.len());
    for slot in slots {
        let mut pending = Vec::new();
        match slot {
            BlockSlot::Deferred(id) => pending.push(id),
            BlockSlot::Real { block, children } => {
                out.push(materialize(block, children, &mut pending));
            }
        }
        if pending.is_empty() {
            continue;
        }

        let mut entries: Vec<DeferredEntry> = Vec::with_capacity(pending.len());
        for id in pending {
            match markers.remove(&id) {
                Some(entry) => entries.push(entry),
                None => diagnostics.warn(format!("Dropping marker {} with no deferred blocks", id)),
            }
        }
        sort_by_key_order(&mut entries, order, |entry| entry.source);
        out.extend(entries.into_iter().flat_map(|entry| entry.blocks));
    }
    out
}

/// Builds the block tree under `block`, collecting the markers found in it.
fn materialize(mut block: Block, children: Vec<BlockSlot>, pending: &mut Vec<MarkerId>) -> Block {
    let mut built = Vec::with_capacity(children.len());
    for child in children {
        match child {
            BlockSlot::Deferred(id) => pending.push(id),
            BlockSlot::Real { block, children } => built.push(materialize(block, children, pending)),
        }
    }
    if !built.is_empty() {
        block.children_mut().extend(built);
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse::parse_fragment;
    use crate::dom::{KeyAllocator, SourceNode};
    use crate::types::RichTextSpan;
    use pretty_assertions::assert_eq;

    fn para(text: &str) -> Block {
        Block::paragraph(vec![RichTextSpan::plain(text)])
    }

    fn item(text: &str) -> Block {
        Block::bulleted(vec![RichTextSpan::plain(text)])
    }

    /// Two keys in document order plus the index over them.
    fn ordered_keys() -> (NodeKey, NodeKey, OrderIndex) {
        let mut keys = KeyAllocator::new();
        let root = parse_fragment("<p>first</p><p>second</p>", &mut keys);
        let index = OrderIndex::build(Some(&root));
        let element = root.as_element().unwrap();
        (element.children[0].key(), element.children[1].key(), index)
    }

    #[test]
    fn deferred_blocks_follow_their_top_level_owner() {
        let (first, _, order) = ordered_keys();
        let mut markers = DeferredBlockMap::new();
        let mut diagnostics = Diagnostics::new();
        let id = markers.insert(first, vec![para("table")]);

        let slots = vec![
            BlockSlot::with_children(
                item("outer"),
                vec![BlockSlot::with_children(
                    item("inner"),
                    vec![BlockSlot::Deferred(id)],
                )],
            ),
            BlockSlot::leaf(para("after")),
        ];
        let blocks = resolve_markers(slots, &mut markers, &order, &mut diagnostics);

        let types: Vec<&str> = blocks.iter().map(Block::block_type).collect();
        assert_eq!(types, vec!["bulleted_list_item", "paragraph", "paragraph"]);
        assert_eq!(blocks[1], para("table"));
        assert_eq!(blocks[0].children()[0].children().len(), 0);
        assert!(markers.is_empty());
        assert!(diagnostics.into_entries().is_empty());
    }

    #[test]
    fn several_entries_under_one_owner_sort_by_document_order() {
        let (first, second, order) = ordered_keys();
        let mut markers = DeferredBlockMap::new();
        let late = markers.insert(second, vec![para("second")]);
        let early = markers.insert(first, vec![para("first")]);

        let slots = vec![BlockSlot::with_children(
            item("owner"),
            vec![BlockSlot::Deferred(late), BlockSlot::Deferred(early)],
        )];
        let blocks = resolve_markers(slots, &mut markers, &order, &mut Diagnostics::new());
        assert_eq!(blocks[1..].to_vec(), vec![para("first"), para("second")]);
    }

    #[test]
    fn unknown_markers_drop_and_orphans_append() {
        let (first, _, order) = ordered_keys();
        let mut markers = DeferredBlockMap::new();
        let mut diagnostics = Diagnostics::new();
        markers.insert(first, vec![para("orphan")]);

        let slots = vec![
            BlockSlot::leaf(para("kept")),
            BlockSlot::with_children(item("x"), vec![BlockSlot::Deferred(MarkerId::fresh())]),
        ];
        let blocks = resolve_markers(slots, &mut markers, &order, &mut diagnostics);

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[2], para("orphan"));
        assert!(markers.is_empty());
        assert_eq!(diagnostics.into_entries().len(), 2);
    }

    #[test]
    fn splice_leaves_unreferenced_entries_in_place() {
        let mut markers = DeferredBlockMap::new();
        let stray = SourceNode::text(KeyAllocator::new().fresh(), "x");
        markers.insert(stray.key(), vec![para("elsewhere")]);

        let blocks = splice(
            vec![BlockSlot::leaf(para("a"))],
            &mut markers,
            &OrderIndex::default(),
            &mut Diagnostics::new(),
        );
        assert_eq!(blocks, vec![para("a")]);
        assert_eq!(markers.len(), 1);
    }
}
