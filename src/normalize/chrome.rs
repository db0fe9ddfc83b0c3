//! Removes page chrome: scripts, controls and image-viewer affordances.

use crate::dom::{ElementNode, SourceNode};
use once_cell::sync::Lazy;
use regex::Regex;

const CHROME_TAGS: &[&str] = &["script", "style", "noscript", "template", "button"];

static CHROME_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)zoom|export|search-?filter|feedback|copy-?(code-?)?button|copy-to-clipboard|mini-?toc")
        .expect("valid chrome regex")
});

static LARGER_VIEW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(click (here )?(for|to see) (a )?)?larger view\s*$")
        .expect("valid larger-view regex")
});

fn is_chrome(element: &ElementNode) -> bool {
    CHROME_TAGS.contains(&element.tag.as_str())
        || element.classes.iter().any(|c| CHROME_NAME.is_match(c))
        || element.id().is_some_and(|id| CHROME_NAME.is_match(id))
}

fn has_image(element: &ElementNode) -> bool {
    element.contains(&|e: &ElementNode| e.tag == "img")
}

fn is_larger_view(element: &ElementNode) -> bool {
    LARGER_VIEW.is_match(&element.text_content())
}

pub fn strip_chrome(root: SourceNode) -> SourceNode {
    match root {
        SourceNode::Element(mut element) => {
            strip_children(&mut element);
            SourceNode::Element(element)
        }
        text => text,
    }
}

fn strip_children(parent: &mut ElementNode) {
    let children = std::mem::take(&mut parent.children);
    let parent_has_direct_image = children.iter().any(|c| c.is_element("img"));

    // Decided against the original siblings so removals don't shift the
    // adjacency checks.
    let keep: Vec<bool> = children
        .iter()
        .enumerate()
        .map(|(index, child)| {
            let SourceNode::Element(element) = child else {
                return true;
            };
            if is_chrome(element) {
                return false;
            }
            if !is_larger_view(element) {
                return true;
            }
            let sibling_has_image = |i: Option<usize>| {
                i.and_then(|i| children.get(i))
                    .and_then(SourceNode::as_element)
                    .is_some_and(has_image)
            };
            let near_image = has_image(element)
                || parent_has_direct_image
                || sibling_has_image(index.checked_sub(1))
                || sibling_has_image(Some(index + 1));
            if near_image {
                log::debug!("Dropping image-viewer link <{}>", element.tag);
            }
            !near_image
        })
        .collect();

    parent.children = children
        .into_iter()
        .zip(keep)
        .filter_map(|(child, keep)| keep.then_some(child))
        .map(|child| match child {
            SourceNode::Element(mut element) => {
                strip_children(&mut element);
                SourceNode::Element(element)
            }
            text => text,
        })
        .collect();
}
