//! Mapping from inline markup to Notion annotations.

use crate::dom::ElementNode;
use crate::types::{Annotations, Color};

/// DITA classes rendered bold.
pub const BOLD_CLASSES: &[&str] = &["uicontrol", "wintitle", "menucascade", "guilabel"];

/// DITA classes rendered as inline code.
pub const CODE_CLASSES: &[&str] = &[
    "codeph",
    "filepath",
    "cmdname",
    "parmname",
    "apiname",
    "option",
    "userinput",
    "systemoutput",
    "keyword-code",
];

/// DITA classes rendered italic.
pub const ITALIC_CLASSES: &[&str] = &["varname", "term", "cite"];

/// Annotations in effect inside `element`, given those of its parent.
pub fn apply_element(element: &ElementNode, inherited: Annotations) -> Annotations {
    let mut annotations = inherited;

    match element.tag.as_str() {
        "b" | "strong" => annotations.bold = true,
        "i" | "em" | "cite" | "dfn" | "var" => annotations.italic = true,
        "code" | "kbd" | "samp" | "tt" => annotations.code = true,
        "s" | "del" | "strike" => annotations.strikethrough = true,
        "u" | "ins" => annotations.underline = true,
        "mark" => annotations.color = Color::YellowBackground,
        _ => {}
    }

    if element.has_any_class(BOLD_CLASSES) {
        annotations.bold = true;
    }
    if element.has_any_class(CODE_CLASSES) {
        annotations.code = true;
    }
    if element.has_any_class(ITALIC_CLASSES) {
        annotations.italic = true;
    }

    if let Some(color) = inline_color(element) {
        annotations.color = color;
    }
    annotations
}

/// Text color from a `style="color: …"` declaration or a `<font color>`.
fn inline_color(element: &ElementNode) -> Option<Color> {
    if let Some(color) = element.attr("color").and_then(Color::from_css_keyword) {
        return Some(color);
    }
    let style = element.attr("style")?;
    style
        .split(';')
        .filter_map(|declaration| declaration.split_once(':'))
        .find(|(property, _)| property.trim().eq_ignore_ascii_case("color"))
        .and_then(|(_, value)| Color::from_css_keyword(value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::KeyAllocator;

    fn element(tag: &str, class: Option<&str>, style: Option<&str>) -> ElementNode {
        let mut keys = KeyAllocator::new();
        let mut el = ElementNode::new(keys.fresh(), tag);
        if let Some(class) = class {
            el = el.with_class(class);
        }
        if let Some(style) = style {
            el = el.with_attr("style", style);
        }
        el
    }

    #[test]
    fn tags_and_classes() {
        let base = Annotations::default();
        assert!(apply_element(&element("strong", None, None), base).bold);
        assert!(apply_element(&element("span", Some("uicontrol"), None), base).bold);
        assert!(apply_element(&element("span", Some("filepath"), None), base).code);
        assert!(apply_element(&element("span", Some("varname"), None), base).italic);
        assert!(apply_element(&element("del", None, None), base).strikethrough);
        assert_eq!(
            apply_element(&element("mark", None, None), base).color,
            Color::YellowBackground
        );
    }

    #[test]
    fn inherited_annotations_accumulate() {
        let bold = apply_element(&element("b", None, None), Annotations::default());
        let both = apply_element(&element("em", None, None), bold);
        assert!(both.bold && both.italic);
    }

    #[test]
    fn inline_style_color() {
        let colored = apply_element(
            &element("span", None, Some("font-weight: bold; color: Red")),
            Annotations::default(),
        );
        assert_eq!(colored.color, Color::Red);
    }
}
