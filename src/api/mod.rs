// src/api/mod.rs
//! Notion API interaction: writing converted pages and resolving media.

pub mod client;
pub mod resolver;
pub mod writer;

use crate::error::PersistenceError;
use serde_json::Value;

/// Raw JSON access to the Notion API.
///
/// The page writer depends on this trait, never on HTTP details.
#[async_trait::async_trait]
pub trait NotionApi: Send + Sync {
    async fn get(&self, endpoint: &str) -> Result<Value, PersistenceError>;
    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, PersistenceError>;
    async fn patch(&self, endpoint: &str, body: &Value) -> Result<Value, PersistenceError>;
}

pub use client::NotionHttpClient;
pub use resolver::ExternalMediaResolver;
pub use writer::NotionPageWriter;
