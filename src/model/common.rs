use super::Block;
use serde::{Deserialize, Serialize};

/// Fields shared by every block payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockCommon {
    pub children: Vec<Block>,
}

impl BlockCommon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_children(children: Vec<Block>) -> Self {
        Self { children }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}
