//! Structural normalization of the source tree before classification.
//!
//! Each pass takes ownership of the tree and returns a rewritten one. The
//! order is fixed: emphasis classes must become `<strong>`/`<em>` before the
//! markdown pass runs, otherwise `*` inside already-bold text is misread.

mod captions;
mod chrome;
mod emphasis;
mod markdown;
mod placeholders;
mod video;
mod wrappers;

pub use video::{VideoInfo, VideoPlatform, VIDEO_EMBED_CLASS};

use crate::dom::{KeyAllocator, SourceNode};

/// The normalized tree plus the videos lifted out of it.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub root: SourceNode,
    pub videos: Vec<VideoInfo>,
}

/// Runs every normalization pass in order.
pub fn normalize(root: SourceNode, keys: &mut KeyAllocator) -> Normalized {
    let (root, videos) = video::extract_videos(root);
    if !videos.is_empty() {
        log::debug!("Extracted {} embedded video(s)", videos.len());
    }

    let root = captions::recover_table_captions(root, keys);
    let root = wrappers::unwrap_wrappers(root);
    let root = emphasis::normalize_emphasis_classes(root, keys);
    let root = chrome::strip_chrome(root);
    let root = markdown::convert_markdown_emphasis(root, keys);
    let root = placeholders::clean_image_placeholders(root, keys);

    Normalized { root, videos }
}

/// Rewrites the tree bottom-up.
///
/// Children are rewritten first; `f` then receives the node and returns
/// its replacement, which may be zero or several nodes. The root is
/// replaced by its first resulting node, or kept when `f` drops it.
pub(crate) fn rewrite_tree<F>(root: SourceNode, f: &mut F) -> SourceNode
where
    F: FnMut(SourceNode) -> Vec<SourceNode>,
{
    let fallback = root.clone();
    rewrite_node(root, f).into_iter().next().unwrap_or(fallback)
}

fn rewrite_node<F>(node: SourceNode, f: &mut F) -> Vec<SourceNode>
where
    F: FnMut(SourceNode) -> Vec<SourceNode>,
{
    match node {
        SourceNode::Element(mut element) => {
            let children = std::mem::take(&mut element.children);
            element.children = children
                .into_iter()
                .flat_map(|child| rewrite_node(child, f))
                .collect();
            f(SourceNode::Element(element))
        }
        text @ SourceNode::Text(_) => f(text),
    }
}
