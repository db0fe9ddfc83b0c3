// src/pipeline.rs
//! Pipeline capability traits and the extraction entry points.
//!
//! Extraction runs parse → normalize → index → convert → resolve markers,
//! then hands images to a [`MediaResolver`]. Persisting the result is the
//! job of a [`PageWriter`].

use crate::analytics::{validate, ValidationReport};
use crate::config::ExtractionConfig;
use crate::convert::{
    convert, resolve_markers, resolve_media, Conversion, ExtractionContext, OrderIndex,
};
use crate::dom::parse_content;
use crate::error::{AppError, MediaUnavailable};
use crate::model::{Block, PageMetadata, PageReceipt};
use crate::normalize::{normalize, VideoInfo};
use crate::types::{plain_text, Diagnostic, Diagnostics};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a resolver hands back for one image URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaReference {
    /// The bytes were uploaded to Notion.
    FileUpload { id: String },
    /// Notion should hotlink the image.
    External { url: String },
}

/// Turns image URLs found in the page into references Notion can display.
#[async_trait::async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<MediaReference, MediaUnavailable>;
}

/// Persists a converted page.
#[async_trait::async_trait]
pub trait PageWriter: Send + Sync {
    async fn write_page(
        &self,
        metadata: &PageMetadata,
        blocks: &[Block],
    ) -> Result<PageReceipt, AppError>;
}

/// Everything one extraction produced.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub blocks: Vec<Block>,
    pub videos: Vec<VideoInfo>,
    pub diagnostics: Vec<Diagnostic>,
    pub validation: ValidationReport,
    /// The selector that picked the content region.
    pub selector: String,
    pub extracted_at: DateTime<Utc>,
}

impl Extraction {
    /// Text of the first top-level heading, if any.
    pub fn first_heading(&self) -> Option<String> {
        self.blocks.iter().find_map(|block| match block {
            Block::Heading1(_) | Block::Heading2(_) => block
                .rich_text()
                .map(plain_text)
                .filter(|text| !text.trim().is_empty()),
            _ => None,
        })
    }
}

/// Converts a captured page into blocks. Images stay unresolved.
pub fn extract_blocks(html: &str, config: &ExtractionConfig) -> Result<Extraction, AppError> {
    let mut ectx = ExtractionContext::new(config);

    let content = parse_content(html, &config.content_selectors, &mut ectx.keys)?;
    let normalized = normalize(content.root, &mut ectx.keys);
    let order = OrderIndex::build(Some(&normalized.root));
    if config.debug {
        log::debug!(
            "Indexed {} source nodes under '{}'",
            order.len(),
            content.selector
        );
    }

    let Conversion { slots, mut markers } = convert(&normalized.root, &mut ectx, &order);
    let blocks = resolve_markers(slots, &mut markers, &order, &mut ectx.diagnostics);
    if blocks.is_empty() {
        return Err(AppError::NoContentFound {
            selectors: vec![content.selector],
        });
    }

    let validation = validate(&normalized.root, &blocks);
    log::info!(
        "Extracted {} top-level block(s) and {} video(s)",
        blocks.len(),
        normalized.videos.len()
    );

    Ok(Extraction {
        blocks,
        videos: normalized.videos,
        diagnostics: ectx.diagnostics.into_entries(),
        validation,
        selector: content.selector,
        extracted_at: Utc::now(),
    })
}

/// Converts a captured page and resolves its images.
pub async fn extract_page(
    html: &str,
    config: &ExtractionConfig,
    resolver: &dyn MediaResolver,
) -> Result<Extraction, AppError> {
    let mut extraction = extract_blocks(html, config)?;
    let mut diagnostics = Diagnostics::new();
    resolve_media(&mut extraction.blocks, resolver, &mut diagnostics).await;
    extraction.diagnostics.extend(diagnostics.into_entries());
    Ok(extraction)
}

/// Extracts, resolves media and writes the page.
pub async fn publish(
    html: &str,
    metadata: &PageMetadata,
    config: &ExtractionConfig,
    resolver: &dyn MediaResolver,
    writer: &dyn PageWriter,
) -> Result<(Extraction, PageReceipt), AppError> {
    let extraction = extract_page(html, config, resolver).await?;
    if extraction.validation.has_errors {
        for error in &extraction.validation.errors {
            log::warn!("Validation: {}", error);
        }
    }
    let receipt = writer.write_page(metadata, &extraction.blocks).await?;
    log::info!("Created page {} ({})", receipt.page_id, receipt.url);
    Ok((extraction, receipt))
}
