use super::Color;
use serde::{Deserialize, Serialize};

/// Notion's annotation set for one rich text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: Color,
}

impl Annotations {
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Self::default()
        }
    }

    pub fn italic() -> Self {
        Self {
            italic: true,
            ..Self::default()
        }
    }

    pub fn code() -> Self {
        Self {
            code: true,
            ..Self::default()
        }
    }

    /// Checks if any styling is applied.
    pub fn has_styling(&self) -> bool {
        *self != Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
}

/// One contiguous run of text sharing a single annotation set and link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichTextSpan {
    pub content: String,
    pub annotations: Annotations,
    pub link: Option<Link>,
}

impl RichTextSpan {
    /// Create a plain, unannotated span.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            content: text.into(),
            annotations: Annotations::default(),
            link: None,
        }
    }

    pub fn styled(text: impl Into<String>, annotations: Annotations) -> Self {
        Self {
            content: text.into(),
            annotations,
            link: None,
        }
    }

    /// Whether `other` may be coalesced into this span.
    pub fn same_style(&self, other: &RichTextSpan) -> bool {
        self.annotations == other.annotations && self.link == other.link
    }

    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Concatenates the visible text of a span sequence.
pub fn plain_text(spans: &[RichTextSpan]) -> String {
    spans.iter().map(|s| s.content.as_str()).collect()
}
