// src/api/writer.rs
//! Persists converted pages into a Notion database.
//!
//! The page is created with the first chunk of top-level blocks; remaining
//! chunks are appended afterwards. Nested children are written level by
//! level, because the API only returns block IDs for the level it created.

use super::NotionApi;
use crate::constants::NOTION_MAX_CHILDREN_PER_REQUEST;
use crate::error::{AppError, PersistenceError};
use crate::error_recovery::{retry_with_backoff, retry_with_backoff_if, RetryPolicy};
use crate::model::wire::{icon_json, rich_text_json, ChildPolicy};
use crate::model::{Block, PageMetadata, PageReceipt};
use crate::pipeline::PageWriter;
use crate::types::{NotionId, RichTextSpan};
use serde_json::{json, Map, Value};
use std::collections::VecDeque;

/// Property that receives the source URL when one is set.
const SOURCE_URL_PROPERTY: &str = "URL";

/// [`PageWriter`] backed by the Notion REST API.
pub struct NotionPageWriter<A: NotionApi> {
    api: A,
    retry: RetryPolicy,
}

impl<A: NotionApi> NotionPageWriter<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    // Creates and appends are not idempotent: a timed-out attempt may have
    // landed, and sending it again would duplicate the page or its blocks.
    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, PersistenceError> {
        let send = || self.api.post(endpoint, body);
        retry_with_backoff_if(send, self.retry, PersistenceError::is_safe_to_resend).await
    }

    async fn patch(&self, endpoint: &str, body: &Value) -> Result<Value, PersistenceError> {
        let send = || self.api.patch(endpoint, body);
        retry_with_backoff_if(send, self.retry, PersistenceError::is_safe_to_resend).await
    }

    async fn get(&self, endpoint: &str) -> Result<Value, PersistenceError> {
        retry_with_backoff(|| self.api.get(endpoint), self.retry).await
    }

    /// Appends `blocks` under `parent` in request-sized chunks and queues
    /// every created block that still has children to write.
    async fn append_level<'b>(
        &self,
        parent: &str,
        blocks: &'b [Block],
        queue: &mut VecDeque<(String, &'b [Block])>,
    ) -> Result<(), PersistenceError> {
        let endpoint = format!("blocks/{}/children", parent);
        for chunk in blocks.chunks(NOTION_MAX_CHILDREN_PER_REQUEST) {
            let body = json!({ "children": shallow_json(chunk) });
            let response = self.patch(&endpoint, &body).await?;
            queue_children(chunk, &result_ids(&response)?, queue)?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<A: NotionApi> PageWriter for NotionPageWriter<A> {
    async fn write_page(
        &self,
        metadata: &PageMetadata,
        blocks: &[Block],
    ) -> Result<PageReceipt, AppError> {
        let split = blocks.len().min(NOTION_MAX_CHILDREN_PER_REQUEST);
        let (first, rest) = blocks.split_at(split);

        let created = self.post("pages", &page_body(metadata, first)).await?;
        let page_id = created
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::MalformedResponse("Created page has no id".to_string()))?
            .to_string();
        let url = created
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        log::debug!("Created page {} with {} block(s)", page_id, first.len());

        let mut queue = VecDeque::new();
        if first.iter().any(needs_follow_up) {
            // The create response does not list the new blocks.
            let listing = self
                .get(&format!(
                    "blocks/{}/children?page_size={}",
                    page_id, NOTION_MAX_CHILDREN_PER_REQUEST
                ))
                .await?;
            queue_children(first, &result_ids(&listing)?, &mut queue)?;
        }
        if !rest.is_empty() {
            log::debug!("Appending {} remaining top-level block(s)", rest.len());
            self.append_level(&page_id, rest, &mut queue).await?;
        }

        while let Some((parent, children)) = queue.pop_front() {
            self.append_level(&parent, children, &mut queue).await?;
        }

        Ok(PageReceipt {
            page_id: NotionId::parse(&page_id)?,
            url,
        })
    }
}

/// Whether a block's children must be written in a later request.
fn needs_follow_up(block: &Block) -> bool {
    !matches!(block, Block::Table(_)) && block.has_children()
}

fn shallow_json(blocks: &[Block]) -> Vec<Value> {
    blocks
        .iter()
        .map(|block| block.to_notion_json_with(ChildPolicy::Shallow))
        .collect()
}

fn result_ids(response: &Value) -> Result<Vec<String>, PersistenceError> {
    let results = response
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| PersistenceError::MalformedResponse("missing 'results' array".to_string()))?;
    results
        .iter()
        .map(|result| {
            result
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| PersistenceError::MalformedResponse("result without 'id'".to_string()))
        })
        .collect()
}

fn queue_children<'b>(
    blocks: &'b [Block],
    ids: &[String],
    queue: &mut VecDeque<(String, &'b [Block])>,
) -> Result<(), PersistenceError> {
    if ids.len() < blocks.len() {
        return Err(PersistenceError::MalformedResponse(format!(
            "expected {} created block id(s), got {}",
            blocks.len(),
            ids.len()
        )));
    }
    for (block, id) in blocks.iter().zip(ids) {
        if needs_follow_up(block) {
            queue.push_back((id.clone(), block.children().as_slice()));
        }
    }
    Ok(())
}

/// Request body for `POST /pages`.
pub fn page_body(metadata: &PageMetadata, children: &[Block]) -> Value {
    let mut properties = Map::new();
    properties.insert(
        metadata.title_property.as_str().to_string(),
        json!({ "title": rich_text_json(&[RichTextSpan::plain(metadata.title.clone())]) }),
    );
    if let Some(source) = &metadata.source_url {
        properties.insert(
            SOURCE_URL_PROPERTY.to_string(),
            json!({ "url": source.as_str() }),
        );
    }
    for (name, value) in &metadata.properties {
        properties.insert(
            name.as_str().to_string(),
            json!({ "rich_text": rich_text_json(&[RichTextSpan::plain(value.clone())]) }),
        );
    }

    let mut body = json!({
        "parent": { "database_id": metadata.database_id.to_hyphenated() },
        "properties": Value::Object(properties),
        "children": shallow_json(children),
    });
    if let Value::Object(map) = &mut body {
        if let Some(icon) = &metadata.icon {
            map.insert("icon".to_string(), icon_json(icon));
        }
        if let Some(cover) = &metadata.cover {
            map.insert(
                "cover".to_string(),
                json!({ "type": "external", "external": { "url": cover.as_str() } }),
            );
        }
    }
    body
}
