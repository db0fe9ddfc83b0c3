//! Replaces `[Invalid Image: path]` text left by failed media fetches.

use super::rewrite_tree;
use crate::dom::{ElementNode, KeyAllocator, SourceNode};
use once_cell::sync::Lazy;
use regex::Regex;

static INVALID_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[Invalid Image:\s*([^\]]*)\]").expect("valid placeholder regex")
});

/// The file name at the end of a path or URL, without query or fragment.
fn file_name(path: &str) -> &str {
    let path = path.trim();
    let path = path.split(['?', '#']).next().unwrap_or(path);
    path.rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
}

pub fn clean_image_placeholders(root: SourceNode, keys: &mut KeyAllocator) -> SourceNode {
    rewrite_tree(root, &mut |node| match node {
        SourceNode::Text(text) if INVALID_IMAGE.is_match(&text.content) => {
            let mut out = Vec::new();
            let mut cursor = 0;
            for captures in INVALID_IMAGE.captures_iter(&text.content) {
                let (Some(whole), Some(path)) = (captures.get(0), captures.get(1)) else {
                    continue;
                };
                if whole.start() > cursor {
                    out.push(SourceNode::text(keys.fresh(), &text.content[cursor..whole.start()]));
                }
                let label = format!("Image: {}", file_name(path.as_str()));
                let em = ElementNode::new(keys.fresh(), "em")
                    .with_children(vec![SourceNode::text(keys.fresh(), label)]);
                out.push(em.into_node());
                cursor = whole.end();
            }
            if cursor < text.content.len() {
                out.push(SourceNode::text(keys.fresh(), &text.content[cursor..]));
            }
            out
        }
        other => vec![other],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse::parse_fragment;

    #[test]
    fn placeholder_becomes_italic_file_name() {
        let mut keys = KeyAllocator::new();
        let root = clean_image_placeholders(
            parse_fragment(
                "<p>See [Invalid Image: /images/flow/designer.png?v=2] above</p>",
                &mut keys,
            ),
            &mut keys,
        );
        let p = root.as_element().unwrap().child_elements().next().unwrap();
        let em = p.child_elements().next().unwrap();
        assert_eq!(em.tag, "em");
        assert_eq!(em.text_content(), "Image: designer.png");
        assert_eq!(p.text_content(), "See Image: designer.png above");
    }

    #[test]
    fn file_names() {
        assert_eq!(file_name("a\\b\\c.gif"), "c.gif");
        assert_eq!(file_name("plain.png"), "plain.png");
        assert_eq!(file_name("dir/"), "dir");
    }
}
