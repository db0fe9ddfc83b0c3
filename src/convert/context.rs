//! Ambient state threaded through conversion.

use crate::config::ExtractionConfig;
use crate::constants::CALLOUT_LIST_DEPTH_LIMIT;
use crate::dom::KeyAllocator;
use crate::rich_text::InlineContext;
use crate::types::Diagnostics;
use im_rc::Vector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListKind {
    #[default]
    Bulleted,
    Numbered,
}

/// Immutable per-descent context. Every transition returns a new value.
#[derive(Debug, Clone, Default)]
pub struct ConversionContext {
    depth: usize,
    inside_callout: bool,
    list_depth: usize,
    list_kind: ListKind,
    in_table_cell: bool,
    /// Block types entered on the way down, for diagnostics.
    trail: Vector<&'static str>,
}

impl ConversionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn inside_callout(&self) -> bool {
        self.inside_callout
    }

    pub fn list_depth(&self) -> usize {
        self.list_depth
    }

    pub fn inside_list_item(&self) -> bool {
        self.list_depth > 0
    }

    pub fn list_kind(&self) -> ListKind {
        self.list_kind
    }

    pub fn in_table_cell(&self) -> bool {
        self.in_table_cell
    }

    /// Whether a callout here would be nested too deep inside lists.
    pub fn callout_must_defer(&self) -> bool {
        self.list_depth >= CALLOUT_LIST_DEPTH_LIMIT
    }

    /// One element deeper.
    pub fn descend(&self) -> Self {
        let mut next = self.clone();
        next.depth += 1;
        next
    }

    pub fn entering_callout(&self) -> Self {
        let mut next = self.descend();
        next.inside_callout = true;
        next.trail.push_back("callout");
        next
    }

    pub fn entering_list(&self, kind: ListKind) -> Self {
        let mut next = self.descend();
        next.list_kind = kind;
        next
    }

    pub fn entering_list_item(&self) -> Self {
        let mut next = self.descend();
        next.list_depth += 1;
        next.trail.push_back("list_item");
        next
    }

    pub fn entering_table_cell(&self) -> Self {
        let mut next = self.descend();
        next.in_table_cell = true;
        next.trail.push_back("table_cell");
        next
    }

    /// Context for content lifted out of its container to the top level.
    ///
    /// Depth is kept so the recursion guard still holds; the list and
    /// callout ancestry no longer applies.
    pub fn lifted(&self) -> Self {
        Self {
            depth: self.depth,
            trail: Vector::new(),
            ..Self::default()
        }
    }

    /// Where in the block tree we are, e.g. `list_item > callout`.
    pub fn location(&self) -> String {
        if self.trail.is_empty() {
            return "top level".to_string();
        }
        self.trail.iter().copied().collect::<Vec<_>>().join(" > ")
    }
}

/// Per-call extraction state: read-only configuration plus the key
/// allocator and the diagnostics sink. Built fresh for every extraction.
#[derive(Debug)]
pub struct ExtractionContext<'a> {
    pub config: &'a ExtractionConfig,
    pub keys: KeyAllocator,
    pub diagnostics: Diagnostics,
}

impl<'a> ExtractionContext<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Self {
        Self {
            config,
            keys: KeyAllocator::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn inline(&self) -> InlineContext<'a> {
        InlineContext {
            base_url: self.config.base_url.as_ref(),
            max_span_len: self.config.max_span_len,
            flatten_blocks: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_do_not_mutate_the_parent() {
        let root = ConversionContext::new();
        let item = root.entering_list_item();
        let nested = item.entering_list_item().entering_callout();

        assert_eq!(root.depth(), 0);
        assert!(!root.inside_list_item());
        assert!(item.inside_list_item());
        assert!(!item.callout_must_defer());
        assert!(nested.callout_must_defer());
        assert!(nested.inside_callout());
        assert_eq!(nested.location(), "list_item > list_item > callout");
        assert_eq!(root.location(), "top level");
    }

    #[test]
    fn lifted_context_keeps_depth_only() {
        let ctx = ConversionContext::new()
            .entering_list_item()
            .entering_callout()
            .descend();
        let lifted = ctx.lifted();
        assert_eq!(lifted.depth(), ctx.depth());
        assert!(!lifted.inside_list_item());
        assert!(!lifted.inside_callout());
    }
}
