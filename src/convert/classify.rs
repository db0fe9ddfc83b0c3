//! Decides what each source element becomes.

use super::context::{ConversionContext, ListKind};
use crate::dom::ElementNode;
use crate::model::Icon;
use crate::normalize::VIDEO_EMBED_CLASS;
use crate::types::Color;

/// Visual style of a callout, derived from its marker class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalloutStyle {
    pub emoji: &'static str,
    pub color: Color,
}

impl CalloutStyle {
    pub const VIDEO: CalloutStyle = CalloutStyle {
        emoji: "🎥",
        color: Color::PurpleBackground,
    };

    pub fn icon(&self) -> Icon {
        Icon::emoji(self.emoji)
    }

    pub fn for_element(element: &ElementNode) -> Self {
        let (emoji, color) = if element.has_class("prereq") {
            ("📍", Color::GrayBackground)
        } else if element.has_any_class(&["warning", "danger"]) {
            ("⚠️", Color::RedBackground)
        } else if element.has_any_class(&["caution", "attention"]) {
            ("⚠️", Color::OrangeBackground)
        } else if element.has_any_class(&["important", "restriction"]) {
            ("❗", Color::YellowBackground)
        } else if element.has_class("tip") {
            ("💡", Color::GreenBackground)
        } else if element.has_class("remember") {
            ("📌", Color::BlueBackground)
        } else {
            ("ℹ️", Color::BlueBackground)
        };
        Self { emoji, color }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListItemKind {
    Bulleted,
    Numbered,
    ToDo { checked: bool },
}

/// The block an element is converted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    /// A definition term: a paragraph rendered bold.
    Term,
    Heading(u8),
    ListItem(ListItemKind),
    Quote,
    Callout(CalloutStyle),
    VideoEmbed,
    Code,
    Divider,
    Image,
    Table,
    TableRow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockDecision {
    Emit(BlockKind),
    /// Convert the children in place of the element.
    Transparent,
    Skip,
    /// Convert elsewhere and leave a marker in the current position.
    Defer(BlockKind),
}

const HEADING_CLASSES: &[(&str, u8)] = &[
    ("topictitle1", 1),
    ("topictitle2", 2),
    ("topictitle3", 3),
    ("sectiontitle", 2),
    ("table-caption", 3),
];

const CODE_BLOCK_CLASSES: &[&str] = &["codeblock", "pre", "highlight", "code-block"];

/// Classes of elements whose text heads a callout.
pub const CALLOUT_TITLE_CLASSES: &[&str] = &[
    "note__title",
    "notetitle",
    "note_title",
    "title",
    "tasklabel",
    "sectiontitle",
];

pub fn is_table_like(element: &ElementNode) -> bool {
    element.tag == "table" || matches!(element.attr("role"), Some("table" | "grid"))
}

pub fn is_table_row(element: &ElementNode) -> bool {
    element.tag == "tr" || element.attr("role") == Some("row")
}

pub fn is_video_embed(element: &ElementNode) -> bool {
    element.has_class(VIDEO_EMBED_CLASS)
}

fn heading_level(element: &ElementNode) -> Option<u8> {
    let tag = element.tag.as_bytes();
    if tag.len() == 2 && tag[0] == b'h' && (b'1'..=b'6').contains(&tag[1]) {
        return Some((tag[1] - b'0').min(3));
    }
    if element.is_inline() {
        return None;
    }
    HEADING_CLASSES
        .iter()
        .find(|(class, _)| element.has_class(class))
        .map(|&(_, level)| level)
}

fn is_code_block(element: &ElementNode) -> bool {
    element.tag == "pre" || (!element.is_inline() && element.has_any_class(CODE_BLOCK_CLASSES))
}

fn is_checkbox(element: &ElementNode) -> bool {
    element.tag == "input" && element.attr("type").is_some_and(|t| t.eq_ignore_ascii_case("checkbox"))
}

fn list_item_kind(element: &ElementNode, ctx: &ConversionContext) -> ListItemKind {
    let checkbox = element
        .child_elements()
        .find(|child| is_checkbox(child))
        .or_else(|| {
            element
                .child_elements()
                .filter(|child| child.is_inline())
                .find_map(|child| child.find_descendant(&is_checkbox))
        });
    if let Some(checkbox) = checkbox {
        return ListItemKind::ToDo {
            checked: checkbox.attrs.contains_key("checked"),
        };
    }
    match ctx.list_kind() {
        ListKind::Bulleted => ListItemKind::Bulleted,
        ListKind::Numbered => ListItemKind::Numbered,
    }
}

/// Whether the element carries anything worth a block.
fn is_meaningful(element: &ElementNode) -> bool {
    element.children.iter().any(|child| child.has_text())
        || element.contains(&|e: &ElementNode| e.tag == "img" || is_video_embed(e) || e.tag == "hr")
}

/// Classifies one element. First matching rule wins.
pub fn classify(element: &ElementNode, ctx: &ConversionContext) -> BlockDecision {
    let table_like = is_table_like(element);
    let callout = element.is_callout();
    let video = is_video_embed(element);

    if table_like && ctx.in_table_cell() {
        return BlockDecision::Transparent;
    }
    if table_like && ctx.inside_list_item() {
        return BlockDecision::Defer(BlockKind::Table);
    }
    if callout && ctx.inside_callout() {
        return BlockDecision::Transparent;
    }
    if (callout || video) && ctx.callout_must_defer() {
        let kind = if video {
            BlockKind::VideoEmbed
        } else {
            BlockKind::Callout(CalloutStyle::for_element(element))
        };
        return BlockDecision::Defer(kind);
    }
    if video {
        return BlockDecision::Emit(BlockKind::VideoEmbed);
    }
    if callout {
        return BlockDecision::Emit(BlockKind::Callout(CalloutStyle::for_element(element)));
    }
    if table_like {
        return BlockDecision::Emit(BlockKind::Table);
    }
    if is_table_row(element) {
        return BlockDecision::Emit(BlockKind::TableRow);
    }
    if let Some(level) = heading_level(element) {
        return if is_meaningful(element) {
            BlockDecision::Emit(BlockKind::Heading(level))
        } else {
            BlockDecision::Skip
        };
    }

    match element.tag.as_str() {
        "ul" | "ol" | "dl" | "menu" | "dir" => return BlockDecision::Transparent,
        "li" => return BlockDecision::Emit(BlockKind::ListItem(list_item_kind(element, ctx))),
        "dt" => return BlockDecision::Emit(BlockKind::Term),
        "hr" => return BlockDecision::Emit(BlockKind::Divider),
        "img" => return BlockDecision::Emit(BlockKind::Image),
        "figure" if element.find_descendant(&|e: &ElementNode| e.tag == "img").is_some() => {
            return BlockDecision::Emit(BlockKind::Image)
        }
        _ => {}
    }
    if is_code_block(element) {
        return BlockDecision::Emit(BlockKind::Code);
    }
    if element.tag == "blockquote" {
        return BlockDecision::Emit(BlockKind::Quote);
    }

    if !is_meaningful(element) {
        return BlockDecision::Skip;
    }
    if element.has_block_children() {
        BlockDecision::Transparent
    } else {
        BlockDecision::Emit(BlockKind::Paragraph)
    }
}
