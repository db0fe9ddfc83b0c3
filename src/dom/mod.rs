//! Closed source-tree representation of captured HTML.
//!
//! The HTML document is parsed once (see [`parse`]) into [`SourceNode`]s.
//! Every node carries a [`NodeKey`] assigned at parse time; nodes the
//! normalizer synthesizes get fresh keys from the same [`KeyAllocator`], so
//! keys stay unique within one extraction.

pub mod parse;

pub use parse::{parse_content, ContentRoot};

use indexmap::IndexMap;

/// Stable identity of a source node within one extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(u32);

impl NodeKey {
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Hands out node keys in increasing order.
#[derive(Debug, Default)]
pub struct KeyAllocator {
    next: u32,
}

impl KeyAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> NodeKey {
        let key = NodeKey(self.next);
        self.next += 1;
        key
    }

    /// Number of keys handed out so far.
    pub fn issued(&self) -> u32 {
        self.next
    }
}

/// A node of the captured document.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceNode {
    Element(ElementNode),
    Text(TextNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub key: NodeKey,
    /// Lowercase tag name.
    pub tag: String,
    pub classes: Vec<String>,
    /// Attributes other than `class`, in document order.
    pub attrs: IndexMap<String, String>,
    pub children: Vec<SourceNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub key: NodeKey,
    pub content: String,
}

/// Elements that render inline and are walked by the rich text builder.
pub const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "cite", "code", "data", "dfn", "em", "font", "i",
    "img", "input", "ins", "del", "kbd", "label", "mark", "q", "s", "samp", "small", "span",
    "strike", "strong", "sub", "sup", "time", "tt", "u", "var", "wbr",
];

/// Classes that mark an element as a callout box.
pub const CALLOUT_CLASSES: &[&str] = &[
    "note",
    "warning",
    "caution",
    "tip",
    "important",
    "notice",
    "danger",
    "attention",
    "restriction",
    "remember",
    "callout",
    "prereq",
];

impl SourceNode {
    pub fn text(key: NodeKey, content: impl Into<String>) -> Self {
        SourceNode::Text(TextNode {
            key,
            content: content.into(),
        })
    }

    pub fn key(&self) -> NodeKey {
        match self {
            SourceNode::Element(element) => element.key,
            SourceNode::Text(text) => text.key,
        }
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            SourceNode::Element(element) => Some(element),
            SourceNode::Text(_) => None,
        }
    }

    pub fn is_element(&self, tag: &str) -> bool {
        self.as_element().is_some_and(|e| e.tag == tag)
    }

    /// Text of this node and all of its descendants, unnormalized.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            SourceNode::Text(text) => out.push_str(&text.content),
            SourceNode::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Whether the node renders as inline content.
    pub fn is_inline(&self) -> bool {
        match self {
            SourceNode::Text(_) => true,
            SourceNode::Element(element) => element.is_inline(),
        }
    }

    /// Whether this node holds any non-whitespace text.
    pub fn has_text(&self) -> bool {
        match self {
            SourceNode::Text(text) => !text.content.trim().is_empty(),
            SourceNode::Element(element) => element.children.iter().any(SourceNode::has_text),
        }
    }
}

impl ElementNode {
    pub fn new(key: NodeKey, tag: impl Into<String>) -> Self {
        Self {
            key,
            tag: tag.into().to_ascii_lowercase(),
            classes: Vec::new(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<SourceNode>) -> Self {
        self.children = children;
        self
    }

    pub fn into_node(self) -> SourceNode {
        SourceNode::Element(self)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn has_any_class(&self, classes: &[&str]) -> bool {
        classes.iter().any(|class| self.has_class(class))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn is_inline(&self) -> bool {
        INLINE_TAGS.contains(&self.tag.as_str())
    }

    /// Whether the element is a callout box (note, warning, prerequisites...).
    pub fn is_callout(&self) -> bool {
        !self.is_inline() && self.has_any_class(CALLOUT_CLASSES)
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &ElementNode> {
        self.children.iter().filter_map(SourceNode::as_element)
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }

    /// First descendant element (depth-first, excluding self) matching `pred`.
    pub fn find_descendant<F>(&self, pred: &F) -> Option<&ElementNode>
    where
        F: Fn(&ElementNode) -> bool,
    {
        for child in self.child_elements() {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(pred) {
                return Some(found);
            }
        }
        None
    }

    /// Whether self or any descendant element matches `pred`.
    pub fn contains<F>(&self, pred: &F) -> bool
    where
        F: Fn(&ElementNode) -> bool,
    {
        pred(self) || self.find_descendant(pred).is_some()
    }

    /// Whether any child is a non-inline element.
    pub fn has_block_children(&self) -> bool {
        self.children
            .iter()
            .any(|child| matches!(child, SourceNode::Element(e) if !e.is_inline()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(keys: &mut KeyAllocator) -> ElementNode {
        let strong = ElementNode::new(keys.fresh(), "strong")
            .with_children(vec![SourceNode::text(keys.fresh(), "bold")]);
        let img = ElementNode::new(keys.fresh(), "img").with_attr("src", "a.png");
        ElementNode::new(keys.fresh(), "P")
            .with_class("shortdesc")
            .with_children(vec![
                SourceNode::text(keys.fresh(), "Some "),
                strong.into_node(),
                img.into_node(),
            ])
    }

    #[test]
    fn keys_are_unique_and_increasing() {
        let mut keys = KeyAllocator::new();
        let a = keys.fresh();
        let b = keys.fresh();
        assert!(a < b);
        assert_eq!(keys.issued(), 2);
    }

    #[test]
    fn element_queries() {
        let mut keys = KeyAllocator::new();
        let p = sample(&mut keys);
        assert_eq!(p.tag, "p");
        assert!(p.has_class("shortdesc"));
        assert_eq!(p.text_content(), "Some bold");
        assert!(p.contains(&|e: &ElementNode| e.tag == "img"));
        assert!(!p.has_block_children());
        assert_eq!(
            p.find_descendant(&|e: &ElementNode| e.tag == "img").and_then(|e| e.attr("src")),
            Some("a.png")
        );
    }
}
