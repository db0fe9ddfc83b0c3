// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Most of these mirror hard limits of the Notion API; the rest bound how
//! far the converter is willing to descend into hostile markup.

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// Maximum characters in a single rich text `content` string.
pub const MAX_RICH_TEXT_LENGTH: usize = 2000;

/// Maximum rich text objects in one `rich_text` array.
pub const MAX_RICH_TEXT_ITEMS: usize = 100;

/// Maximum children in one create/append request, and maximum rows a table
/// may carry at creation time.
pub const NOTION_MAX_CHILDREN_PER_REQUEST: usize = 100;

/// Maximum rows emitted into one table block before it is split.
pub const MAX_TABLE_ROWS: usize = NOTION_MAX_CHILDREN_PER_REQUEST;

/// Notion API version header value.
pub const NOTION_API_VERSION: &str = "2022-06-28";

/// Base URL of the Notion REST API.
pub const NOTION_API_BASE_URL: &str = "https://api.notion.com/v1";

/// Language used for code blocks whose language cannot be determined.
pub const DEFAULT_CODE_LANGUAGE: &str = "plain text";

// ---------------------------------------------------------------------------
// Conversion boundaries
// ---------------------------------------------------------------------------

/// Maximum element nesting the block converter descends into.
///
/// Deeper content is flattened to text rather than walked.
pub const MAX_CONVERSION_DEPTH: usize = 50;

/// Maximum element nesting preserved when parsing HTML into source nodes.
pub const MAX_PARSE_DEPTH: usize = 512;

/// List nesting at which a callout can no longer stay inside the list item.
pub const CALLOUT_LIST_DEPTH_LIMIT: usize = 2;

/// Content-region selectors tried in order when none are configured.
pub const DEFAULT_CONTENT_SELECTORS: &[&str] = &[
    ".zDocsTopicPageBody",
    "article.hascomments",
    "article",
    "main",
    "[role='main']",
    ".body.conbody",
    "body",
];

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Attempts made for a retryable Notion request.
pub const WRITE_MAX_ATTEMPTS: u32 = 4;

/// Initial backoff between write attempts, in milliseconds.
pub const WRITE_INITIAL_BACKOFF_MS: u64 = 500;

/// Upper bound on backoff between write attempts, in milliseconds.
pub const WRITE_MAX_BACKOFF_MS: u64 = 8_000;
