//! Video side-channel: lifts embedded players out of the tree.
//!
//! Every recognized player is recorded as a [`VideoInfo`] and replaced in
//! place by a `div.video-embed` element carrying the same information as
//! `data-*` attributes, which the classifier renders as a callout.

use super::rewrite_tree;
use crate::dom::{ElementNode, SourceNode};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const VIDEO_EMBED_CLASS: &str = "video-embed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoPlatform {
    YouTube,
    Vimeo,
    Wistia,
    Brightcove,
    Html5,
}

impl VideoPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoPlatform::YouTube => "YouTube",
            VideoPlatform::Vimeo => "Vimeo",
            VideoPlatform::Wistia => "Wistia",
            VideoPlatform::Brightcove => "Brightcove",
            VideoPlatform::Html5 => "HTML5",
        }
    }
}

impl fmt::Display for VideoPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata of one embedded video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub platform: VideoPlatform,
    pub title: String,
    pub url: String,
    pub thumbnail: Option<String>,
}

static YOUTUBE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:youtube(?:-nocookie)?\.com/(?:embed/|watch\?v=|v/)|youtu\.be/)([A-Za-z0-9_-]{6,})")
        .expect("valid YouTube regex")
});
static VIMEO_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"vimeo\.com/(?:video/)?(\d+)").expect("valid Vimeo regex"));
static WISTIA_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:wistia\.(?:net|com)/(?:embed/(?:iframe|medias)/|medias/)|wistia_async_)([A-Za-z0-9]+)")
        .expect("valid Wistia regex")
});

/// Replaces every recognized player and returns the collected videos in
/// document order.
pub fn extract_videos(root: SourceNode) -> (SourceNode, Vec<VideoInfo>) {
    let mut videos = Vec::new();
    let root = rewrite_tree(root, &mut |node| match node {
        SourceNode::Element(element) => match detect_video(&element) {
            Some(info) => {
                let embed = embed_element(&element, &info);
                videos.push(info);
                vec![embed]
            }
            None => vec![SourceNode::Element(element)],
        },
        text => vec![text],
    });
    (root, videos)
}

fn detect_video(element: &ElementNode) -> Option<VideoInfo> {
    if element.has_class(VIDEO_EMBED_CLASS) {
        return None;
    }
    match element.tag.as_str() {
        "iframe" => element.attr("src").and_then(|src| from_embed_url(element, src)),
        "video" => from_video_tag(element),
        "video-js" => from_brightcove_markup(element),
        _ if element.has_class("video-js") && element.attr("data-video-id").is_some() => {
            from_brightcove_markup(element)
        }
        _ if element.classes.iter().any(|c| c.starts_with("wistia_async_")) => element
            .classes
            .iter()
            .find(|c| c.starts_with("wistia_async_"))
            .and_then(|c| from_embed_url(element, c)),
        _ => None,
    }
}

fn title_of(element: &ElementNode, platform: VideoPlatform) -> String {
    element
        .attr("title")
        .or_else(|| element.attr("aria-label"))
        .or_else(|| element.attr("data-title"))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("{} video", platform))
}

fn from_embed_url(element: &ElementNode, src: &str) -> Option<VideoInfo> {
    let src = if src.starts_with("//") {
        format!("https:{}", src)
    } else {
        src.to_string()
    };

    if let Some(id) = YOUTUBE_ID.captures(&src).and_then(|c| c.get(1)) {
        let id = id.as_str();
        return Some(VideoInfo {
            platform: VideoPlatform::YouTube,
            title: title_of(element, VideoPlatform::YouTube),
            url: format!("https://www.youtube.com/watch?v={}", id),
            thumbnail: Some(format!("https://img.youtube.com/vi/{}/hqdefault.jpg", id)),
        });
    }
    if let Some(id) = VIMEO_ID.captures(&src).and_then(|c| c.get(1)) {
        return Some(VideoInfo {
            platform: VideoPlatform::Vimeo,
            title: title_of(element, VideoPlatform::Vimeo),
            url: format!("https://vimeo.com/{}", id.as_str()),
            thumbnail: None,
        });
    }
    if let Some(id) = WISTIA_ID.captures(&src).and_then(|c| c.get(1)) {
        return Some(VideoInfo {
            platform: VideoPlatform::Wistia,
            title: title_of(element, VideoPlatform::Wistia),
            url: format!("https://fast.wistia.net/embed/iframe/{}", id.as_str()),
            thumbnail: None,
        });
    }
    if src.contains("players.brightcove.net") {
        return Some(VideoInfo {
            platform: VideoPlatform::Brightcove,
            title: title_of(element, VideoPlatform::Brightcove),
            url: src,
            thumbnail: None,
        });
    }
    None
}

fn from_video_tag(element: &ElementNode) -> Option<VideoInfo> {
    let src = element.attr("src").map(str::to_string).or_else(|| {
        element
            .child_elements()
            .filter(|child| child.tag == "source")
            .find_map(|source| source.attr("src").map(str::to_string))
    })?;
    if let Some(embedded) = from_embed_url(element, &src) {
        return Some(embedded);
    }
    Some(VideoInfo {
        platform: VideoPlatform::Html5,
        title: title_of(element, VideoPlatform::Html5),
        url: src,
        thumbnail: element.attr("poster").map(str::to_string),
    })
}

fn from_brightcove_markup(element: &ElementNode) -> Option<VideoInfo> {
    let video_id = element.attr("data-video-id")?;
    let account = element.attr("data-account")?;
    let player = element.attr("data-player").unwrap_or("default");
    let embed = element.attr("data-embed").unwrap_or("default");
    Some(VideoInfo {
        platform: VideoPlatform::Brightcove,
        title: title_of(element, VideoPlatform::Brightcove),
        url: format!(
            "https://players.brightcove.net/{}/{}_{}/index.html?videoId={}",
            account, player, embed, video_id
        ),
        thumbnail: element.attr("poster").map(str::to_string),
    })
}

/// The synthesized element that stands in for a player in the tree.
fn embed_element(original: &ElementNode, info: &VideoInfo) -> SourceNode {
    let mut embed = ElementNode::new(original.key, "div")
        .with_class(VIDEO_EMBED_CLASS)
        .with_attr("data-platform", info.platform.as_str())
        .with_attr("data-title", info.title.clone())
        .with_attr("data-url", info.url.clone());
    if let Some(thumbnail) = &info.thumbnail {
        embed = embed.with_attr("data-thumbnail", thumbnail.clone());
    }
    embed.into_node()
}
