// src/config.rs
use crate::constants::{DEFAULT_CONTENT_SELECTORS, MAX_CONVERSION_DEPTH, MAX_RICH_TEXT_LENGTH};
use crate::error::AppError;
use crate::model::{Icon, PageMetadata};
use crate::types::{ApiKey, NotionId, PropertyName, ValidatedUrl, ValidationError};
use clap::Parser;
use std::path::PathBuf;

/// Parsed and validated command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Saved ServiceNow page (HTML file) to convert
    pub html_file: PathBuf,

    /// Page title (defaults to the first heading in the content)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Target Notion database ID or URL
    #[arg(short, long)]
    pub database: Option<String>,

    /// URL the page was captured from; used to resolve relative links
    #[arg(long)]
    pub source_url: Option<String>,

    /// CSS selector for the content region; repeat to try several in order
    #[arg(short, long = "selector")]
    pub selectors: Vec<String>,

    /// Extra page property as KEY=VALUE (repeatable)
    #[arg(long = "property")]
    pub properties: Vec<String>,

    /// Emoji icon for the created page
    #[arg(long)]
    pub icon: Option<String>,

    /// Cover image URL for the created page
    #[arg(long)]
    pub cover: Option<String>,

    /// Write the extraction (blocks, diagnostics, validation) as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Convert only; print the extraction instead of writing to Notion
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Maximum element nesting depth before content is flattened
    #[arg(long, default_value_t = MAX_CONVERSION_DEPTH)]
    pub max_depth: usize,
}

/// Read-only settings for one extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionConfig {
    /// Tried in order; the first match becomes the content root.
    pub content_selectors: Vec<String>,
    /// Base for resolving relative link and image URLs.
    pub base_url: Option<ValidatedUrl>,
    pub max_depth: usize,
    pub max_span_len: usize,
    pub debug: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            content_selectors: DEFAULT_CONTENT_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            base_url: None,
            max_depth: MAX_CONVERSION_DEPTH,
            max_span_len: MAX_RICH_TEXT_LENGTH,
            debug: false,
        }
    }
}

/// Where the page goes once converted.
#[derive(Debug, Clone)]
pub struct NotionTarget {
    pub api_key: ApiKey,
    pub database_id: NotionId,
}

/// Resolved pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub html_file: PathBuf,
    pub extraction: ExtractionConfig,
    /// `None` in dry-run mode.
    pub target: Option<NotionTarget>,
    pub title: Option<String>,
    pub icon: Option<String>,
    pub cover: Option<ValidatedUrl>,
    pub properties: Vec<(PropertyName, String)>,
    pub output: Option<PathBuf>,
    pub verbose: bool,
}

impl PipelineConfig {
    /// Resolves a complete pipeline configuration from CLI input and environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        let target = if cli.dry_run {
            None
        } else {
            Some(resolve_target(cli.database.as_deref())?)
        };

        let base_url = cli
            .source_url
            .as_deref()
            .map(ValidatedUrl::parse)
            .transpose()?;
        let cover = cli.cover.as_deref().map(ValidatedUrl::parse).transpose()?;
        let properties = cli
            .properties
            .iter()
            .map(|raw| parse_property(raw))
            .collect::<Result<Vec<_>, _>>()?;

        let mut extraction = ExtractionConfig {
            base_url,
            max_depth: cli.max_depth,
            debug: cli.verbose,
            ..ExtractionConfig::default()
        };
        if !cli.selectors.is_empty() {
            extraction.content_selectors = cli.selectors;
        }

        Ok(PipelineConfig {
            html_file: cli.html_file,
            extraction,
            target,
            title: cli.title,
            icon: cli.icon,
            cover,
            properties,
            output: cli.output,
            verbose: cli.verbose,
        })
    }

    pub fn is_dry_run(&self) -> bool {
        self.target.is_none()
    }

    /// Builds page metadata; `fallback_title` is used when no title was given.
    pub fn page_metadata(&self, database_id: NotionId, fallback_title: Option<String>) -> PageMetadata {
        let title = self
            .title
            .clone()
            .or(fallback_title)
            .unwrap_or_else(|| "Untitled".to_string());

        let mut metadata = PageMetadata::new(title, database_id);
        metadata.source_url = self.extraction.base_url.clone();
        metadata.icon = self.icon.clone().map(|emoji| Icon::Emoji { emoji });
        metadata.cover = self.cover.clone();
        metadata.properties = self.properties.iter().cloned().collect();
        metadata
    }
}

fn resolve_target(database: Option<&str>) -> Result<NotionTarget, AppError> {
    let api_key_str = std::env::var("NOTION_API_KEY").map_err(|_| {
        AppError::MissingConfiguration("NOTION_API_KEY environment variable not set".to_string())
    })?;
    let database = database.ok_or_else(|| {
        AppError::MissingConfiguration(
            "--database is required unless --dry-run is given".to_string(),
        )
    })?;

    Ok(NotionTarget {
        api_key: ApiKey::new(api_key_str)?,
        database_id: NotionId::parse(database)?,
    })
}

/// Splits `KEY=VALUE` at the first `=`. Keys are trimmed and must be non-empty.
pub fn parse_property(raw: &str) -> Result<(PropertyName, String), ValidationError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((PropertyName::new(key.trim()), value.to_string()))
        }
        _ => Err(ValidationError::InvalidProperty {
            input: raw.to_string(),
        }),
    }
}
