mod block;
pub mod blocks;
pub mod common;
pub mod wire;

pub use block::{walk_blocks, Block, BlockVisitor};
pub use blocks::*;
pub use common::*;

use crate::types::{NotionId, PropertyName, ValidatedUrl};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Page-level metadata handed to the page writer alongside the blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: String,
    pub database_id: NotionId,
    /// Name of the database's title property.
    pub title_property: PropertyName,
    /// The ServiceNow page the content was captured from.
    pub source_url: Option<ValidatedUrl>,
    pub icon: Option<Icon>,
    pub cover: Option<ValidatedUrl>,
    /// Additional rich-text properties, written in insertion order.
    pub properties: IndexMap<PropertyName, String>,
}

impl PageMetadata {
    pub fn new(title: impl Into<String>, database_id: NotionId) -> Self {
        Self {
            title: title.into(),
            database_id,
            title_property: PropertyName::new("Name"),
            source_url: None,
            icon: None,
            cover: None,
            properties: IndexMap::new(),
        }
    }
}

/// What the page writer reports after persisting a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageReceipt {
    pub page_id: NotionId,
    pub url: String,
}
