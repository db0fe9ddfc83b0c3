// tests/publish_pipeline.rs
//! The asynchronous half of the pipeline: media resolution and page writing
//! against in-memory collaborators.

use pretty_assertions::assert_eq;
use snow2notion::model::MediaSource;
use snow2notion::{
    extract_page, publish, AppError, Block, DiagnosticLevel, ExternalMediaResolver,
    ExtractionConfig, MediaReference, MediaResolver, MediaUnavailable, NotionId, PageMetadata,
    PageReceipt, PageWriter, ValidatedUrl,
};
use std::sync::Mutex;

// =============================================================================
// Test doubles
// =============================================================================

/// Uploads every image except those whose URL mentions "missing".
struct UploadingResolver;

#[async_trait::async_trait]
impl MediaResolver for UploadingResolver {
    async fn resolve(&self, url: &str) -> Result<MediaReference, MediaUnavailable> {
        if url.contains("missing") {
            return Err(MediaUnavailable {
                url: url.to_string(),
                reason: "HTTP 404".to_string(),
            });
        }
        let name = url.rsplit('/').next().unwrap_or_default();
        Ok(MediaReference::FileUpload {
            id: format!("upload-{}", name),
        })
    }
}

/// Keeps whatever it was asked to write.
#[derive(Default)]
struct MemoryWriter {
    written: Mutex<Vec<(String, Vec<Block>)>>,
}

#[async_trait::async_trait]
impl PageWriter for MemoryWriter {
    async fn write_page(
        &self,
        metadata: &PageMetadata,
        blocks: &[Block],
    ) -> Result<PageReceipt, AppError> {
        self.written
            .lock()
            .unwrap()
            .push((metadata.title.clone(), blocks.to_vec()));
        Ok(PageReceipt {
            page_id: metadata.database_id.clone(),
            url: "https://www.notion.so/memory".to_string(),
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

const CATALOG_PAGE: &str = r#"
<html><body><article>
  <h2>Create a catalog item</h2>
  <div class="note"><span class="note__title">Note:</span> Requires the <span class="uicontrol">catalog_admin</span> role.</div>
  <ol>
    <li>Open the form.<img src="images/form.png" alt="Form"></li>
    <li>Attach the diagram.<img src="images/missing.png" alt="Diagram"></li>
  </ol>
</article></body></html>
"#;

fn config() -> ExtractionConfig {
    ExtractionConfig {
        base_url: Some(ValidatedUrl::parse("https://docs.servicenow.com/bundle/page.html").unwrap()),
        ..ExtractionConfig::default()
    }
}

/// One line per block: indented type, then its text or media source.
fn outline(blocks: &[Block]) -> String {
    fn write(blocks: &[Block], depth: usize, out: &mut Vec<String>) {
        for block in blocks {
            let detail = match block {
                Block::Image(image) => match &image.image {
                    MediaSource::FileUpload { id } => format!("file_upload {}", id),
                    MediaSource::External { url } => format!("external {}", url),
                    MediaSource::Unresolved { url } => format!("unresolved {}", url),
                },
                other => snow2notion::types::plain_text(other.rich_text().unwrap_or_default()),
            };
            out.push(format!("{}{}: {}", "  ".repeat(depth), block.block_type(), detail));
            write(block.children(), depth + 1, out);
        }
    }
    let mut out = Vec::new();
    write(blocks, 0, &mut out);
    out.join("\n")
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn published_pages_carry_resolved_media() {
    let writer = MemoryWriter::default();
    let database = NotionId::parse("12345678123456781234567812345678").unwrap();
    let metadata = PageMetadata::new("Create a catalog item", database);

    let (extraction, receipt) =
        publish(CATALOG_PAGE, &metadata, &config(), &UploadingResolver, &writer)
            .await
            .unwrap();

    assert_eq!(receipt.url, "https://www.notion.so/memory");
    insta::assert_snapshot!(outline(&extraction.blocks), @r###"
    heading_2: Create a catalog item
    callout: Note: Requires the catalog_admin role.
    numbered_list_item: Open the form.
      image: file_upload upload-form.png
    numbered_list_item: Attach the diagram.
      paragraph: Image unavailable: missing.png
    "###);

    let written = writer.written.lock().unwrap();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].0, "Create a catalog item");
    assert_eq!(written[0].1, extraction.blocks);

    let media_warnings: Vec<_> = extraction
        .diagnostics
        .iter()
        .filter(|d| d.block.as_deref() == Some("image"))
        .collect();
    assert_eq!(media_warnings.len(), 1);
    assert_eq!(media_warnings[0].level, DiagnosticLevel::Warning);
}

#[tokio::test]
async fn placeholder_images_are_italic() {
    let extraction = extract_page(CATALOG_PAGE, &config(), &UploadingResolver)
        .await
        .unwrap();

    let placeholder = &extraction.blocks[3].children()[0];
    let spans = placeholder.rich_text().unwrap();
    assert_eq!(spans.len(), 1);
    assert!(spans[0].annotations.italic);
}

#[tokio::test]
async fn external_resolver_hotlinks_absolute_urls() {
    let extraction = extract_page(CATALOG_PAGE, &config(), &ExternalMediaResolver::default())
        .await
        .unwrap();

    let Block::Image(image) = &extraction.blocks[2].children()[0] else {
        panic!("expected the hoisted image");
    };
    assert_eq!(
        image.image,
        MediaSource::External {
            url: "https://docs.servicenow.com/bundle/images/form.png".to_string()
        }
    );
}

#[tokio::test]
async fn writer_failures_propagate() {
    struct FailingWriter;

    #[async_trait::async_trait]
    impl PageWriter for FailingWriter {
        async fn write_page(
            &self,
            _metadata: &PageMetadata,
            _blocks: &[Block],
        ) -> Result<PageReceipt, AppError> {
            Err(AppError::NetworkFailure("connection reset".to_string()))
        }
    }

    let database = NotionId::parse("12345678123456781234567812345678").unwrap();
    let result = publish(
        CATALOG_PAGE,
        &PageMetadata::new("x", database),
        &config(),
        &UploadingResolver,
        &FailingWriter,
    )
    .await;
    assert!(matches!(result, Err(AppError::NetworkFailure(_))));
}
