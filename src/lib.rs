// src/lib.rs
//! snow2notion library: converts captured ServiceNow documentation pages
//! into Notion blocks and writes them to a Notion database.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Extraction** — `extract_blocks`, `extract_page`, `publish`, `Extraction`
//! - **Error handling** — `AppError`, `PersistenceError`, `MediaUnavailable`
//! - **Configuration** — `ExtractionConfig`, `PipelineConfig`
//! - **Domain model** — `Block`, `PageMetadata`, `PageReceipt`
//! - **Capability traits** — `MediaResolver`, `PageWriter`
//! - **API client** — `NotionHttpClient`, `NotionPageWriter`, `ExternalMediaResolver`

pub mod analytics;
pub mod api;
pub mod config;
pub mod constants;
pub mod convert;
pub mod dom;
pub mod error;
pub mod error_recovery;
pub mod model;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod rich_text;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, MediaUnavailable, NotionErrorCode, PersistenceError};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{CommandLineInput, ExtractionConfig, PipelineConfig};

// --- Domain Model ---
pub use crate::model::{walk_blocks, Block, BlockVisitor, PageMetadata, PageReceipt};
pub use crate::normalize::VideoInfo;

// --- Domain Types ---
pub use crate::types::{
    Annotations, ApiKey, Color, Diagnostic, DiagnosticLevel, Diagnostics, Link, NotionId,
    PropertyName, RichTextSpan, ValidatedUrl,
};

// --- Pipeline ---
pub use crate::analytics::{validate, ContentCounts, ValidationReport};
pub use crate::pipeline::{
    extract_blocks, extract_page, publish, Extraction, MediaReference, MediaResolver, PageWriter,
};

// --- API Client ---
pub use crate::api::{ExternalMediaResolver, NotionApi, NotionHttpClient, NotionPageWriter};
