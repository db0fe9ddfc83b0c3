//! HTML parsing and content-region selection.

use super::{ElementNode, KeyAllocator, SourceNode};
use crate::constants::MAX_PARSE_DEPTH;
use crate::error::AppError;
use scraper::{ElementRef, Html, Node, Selector};

/// The content region chosen from a captured document.
#[derive(Debug, Clone)]
pub struct ContentRoot {
    pub root: SourceNode,
    /// The selector that matched the region.
    pub selector: String,
}

/// Parses `html` and converts the first region matching `selectors` into a
/// source tree.
///
/// Selectors are tried in order. Fails with [`AppError::NoContentFound`]
/// when no selector matches or the matched region holds neither text nor
/// images.
pub fn parse_content(
    html: &str,
    selectors: &[String],
    keys: &mut KeyAllocator,
) -> Result<ContentRoot, AppError> {
    let document = Html::parse_document(html);

    for raw in selectors {
        let selector = Selector::parse(raw).map_err(|e| AppError::InvalidSelector {
            selector: raw.clone(),
            reason: e.to_string(),
        })?;

        let Some(region) = document.select(&selector).next() else {
            log::debug!("Content selector '{}' matched nothing", raw);
            continue;
        };

        let root = convert_element(region, keys, 0);
        if !has_content(&root) {
            log::debug!("Content selector '{}' matched an empty region", raw);
            continue;
        }

        log::info!("Selected content region with '{}'", raw);
        return Ok(ContentRoot {
            root,
            selector: raw.clone(),
        });
    }

    Err(AppError::NoContentFound {
        selectors: selectors.to_vec(),
    })
}

/// Parses an HTML fragment into the children of a synthetic `div`.
pub fn parse_fragment(html: &str, keys: &mut KeyAllocator) -> SourceNode {
    let fragment = Html::parse_fragment(html);
    let root = fragment.root_element();
    let mut wrapper = ElementNode::new(keys.fresh(), "div");
    wrapper.children = convert_children(root, keys, 1);
    wrapper.into_node()
}

fn convert_element(element: ElementRef<'_>, keys: &mut KeyAllocator, depth: usize) -> SourceNode {
    let value = element.value();
    let mut node = ElementNode::new(keys.fresh(), value.name());
    node.classes = value.classes().map(str::to_string).collect();
    for (name, attr) in value.attrs() {
        if name != "class" {
            node.attrs.insert(name.to_ascii_lowercase(), attr.to_string());
        }
    }

    if depth >= MAX_PARSE_DEPTH {
        let text: String = element.text().collect();
        log::warn!(
            "Markup nested deeper than {} levels under <{}>; keeping text only",
            MAX_PARSE_DEPTH,
            node.tag
        );
        node.children = vec![SourceNode::text(keys.fresh(), text)];
        return node.into_node();
    }

    node.children = convert_children(element, keys, depth + 1);
    node.into_node()
}

fn convert_children(
    element: ElementRef<'_>,
    keys: &mut KeyAllocator,
    depth: usize,
) -> Vec<SourceNode> {
    let mut children = Vec::new();
    for child in element.children() {
        match child.value() {
            Node::Text(text) => children.push(SourceNode::text(keys.fresh(), &**text)),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    children.push(convert_element(child_element, keys, depth));
                }
            }
            _ => {}
        }
    }
    children
}

fn has_content(node: &SourceNode) -> bool {
    match node {
        SourceNode::Text(text) => !text.content.trim().is_empty(),
        SourceNode::Element(element) => {
            element.tag == "img"
                || element.tag == "iframe"
                || element.tag == "video"
                || element.children.iter().any(has_content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_CONTENT_SELECTORS;

    fn defaults() -> Vec<String> {
        DEFAULT_CONTENT_SELECTORS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn picks_first_matching_region() {
        let html = r#"<html><body><nav>Menu</nav>
            <div class="zDocsTopicPageBody"><p>Body text</p></div></body></html>"#;
        let mut keys = KeyAllocator::new();
        let content = parse_content(html, &defaults(), &mut keys).unwrap();
        assert_eq!(content.selector, ".zDocsTopicPageBody");
        assert_eq!(content.root.text_content().trim(), "Body text");
    }

    #[test]
    fn falls_back_to_body() {
        let mut keys = KeyAllocator::new();
        let content = parse_content("<p>Just a fragment</p>", &defaults(), &mut keys).unwrap();
        assert_eq!(content.selector, "body");
    }

    #[test]
    fn empty_document_is_fatal() {
        let mut keys = KeyAllocator::new();
        let err = parse_content("<html><body>  </body></html>", &defaults(), &mut keys)
            .unwrap_err();
        assert!(err.is_no_content());
    }

    #[test]
    fn image_only_region_counts_as_content() {
        let mut keys = KeyAllocator::new();
        let result = parse_content(r#"<main><img src="a.png"></main>"#, &defaults(), &mut keys);
        assert_eq!(result.map(|c| c.selector).ok().as_deref(), Some("main"));
    }

    #[test]
    fn invalid_selector_is_reported() {
        let mut keys = KeyAllocator::new();
        let err = parse_content("<p>x</p>", &["[[".to_string()], &mut keys).unwrap_err();
        assert!(matches!(err, AppError::InvalidSelector { .. }));
    }

    #[test]
    fn classes_and_attributes_are_split() {
        let mut keys = KeyAllocator::new();
        let root = parse_fragment(r#"<a class="xref link" href="/x">go</a>"#, &mut keys);
        let anchor = root.as_element().unwrap().child_elements().next().unwrap();
        assert_eq!(anchor.classes, vec!["xref".to_string(), "link".to_string()]);
        assert_eq!(anchor.attr("href"), Some("/x"));
        assert_eq!(anchor.attr("class"), None);
    }
}
