//! Concurrent media resolution over a finished block tree.

use crate::model::blocks::MediaSource;
use crate::model::Block;
use crate::pipeline::{MediaReference, MediaResolver};
use crate::types::{Annotations, Diagnostics, RichTextSpan, ValidatedUrl};
use futures::future::join_all;

/// Resolves every unresolved image in `blocks` through `resolver`.
///
/// Requests run concurrently; results are written back by position. An
/// image that cannot be resolved is replaced by an italic placeholder
/// paragraph naming the file.
pub async fn resolve_media(
    blocks: &mut [Block],
    resolver: &dyn MediaResolver,
    diagnostics: &mut Diagnostics,
) {
    let mut pending = Vec::new();
    collect_unresolved(blocks, &mut Vec::new(), &mut pending);
    if pending.is_empty() {
        return;
    }
    log::debug!("Resolving {} image(s)", pending.len());

    let results = join_all(pending.iter().map(|(_, url)| resolver.resolve(url))).await;

    for ((path, url), result) in pending.into_iter().zip(results) {
        let Some(block) = block_at_mut(blocks, &path) else {
            continue;
        };
        match result {
            Ok(reference) => {
                if let Block::Image(image) = block {
                    image.image = match reference {
                        MediaReference::FileUpload { id } => MediaSource::FileUpload { id },
                        MediaReference::External { url } => MediaSource::External { url },
                    };
                }
            }
            Err(e) => {
                diagnostics.warn_block("image", e.to_string());
                *block = placeholder(&url);
            }
        }
    }
}

/// Paths (child indices from the top level) and URLs of unresolved images,
/// in block order.
fn collect_unresolved(blocks: &[Block], path: &mut Vec<usize>, out: &mut Vec<(Vec<usize>, String)>) {
    for (index, block) in blocks.iter().enumerate() {
        path.push(index);
        if let Block::Image(image) = block {
            if let MediaSource::Unresolved { url } = &image.image {
                out.push((path.clone(), url.clone()));
            }
        }
        collect_unresolved(block.children(), path, out);
        path.pop();
    }
}

fn block_at_mut<'b>(blocks: &'b mut [Block], path: &[usize]) -> Option<&'b mut Block> {
    let (first, rest) = path.split_first()?;
    let block = blocks.get_mut(*first)?;
    if rest.is_empty() {
        Some(block)
    } else {
        block_at_mut(block.children_mut(), rest)
    }
}

fn placeholder(url: &str) -> Block {
    let name = ValidatedUrl::parse(url)
        .ok()
        .and_then(|url| url.file_name().map(str::to_string))
        .unwrap_or_else(|| url.to_string());
    Block::paragraph(vec![RichTextSpan::styled(
        format!("Image unavailable: {}", name),
        Annotations::italic(),
    )])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaUnavailable;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    /// Uploads everything except URLs containing "missing".
    struct FakeResolver;

    #[async_trait]
    impl MediaResolver for FakeResolver {
        async fn resolve(&self, url: &str) -> Result<MediaReference, MediaUnavailable> {
            if url.contains("missing") {
                return Err(MediaUnavailable {
                    url: url.to_string(),
                    reason: "404".into(),
                });
            }
            Ok(MediaReference::FileUpload {
                id: format!("upload-{}", url.rsplit('/').next().unwrap_or_default()),
            })
        }
    }

    fn image(url: &str) -> Block {
        Block::image(MediaSource::Unresolved { url: url.into() }, Vec::new())
    }

    #[tokio::test]
    async fn results_are_written_back_by_position() {
        let mut nested = Block::bulleted(vec![RichTextSpan::plain("item")]);
        nested.children_mut().push(image("https://x.test/missing.png"));
        let mut blocks = vec![image("https://x.test/a.png"), nested, image("https://x.test/c.png")];
        let mut diagnostics = Diagnostics::new();

        resolve_media(&mut blocks, &FakeResolver, &mut diagnostics).await;

        let sources: Vec<Option<&MediaSource>> = [&blocks[0], &blocks[2]]
            .iter()
            .map(|block| match block {
                Block::Image(image) => Some(&image.image),
                _ => None,
            })
            .collect();
        assert_eq!(
            sources,
            vec![
                Some(&MediaSource::FileUpload { id: "upload-a.png".into() }),
                Some(&MediaSource::FileUpload { id: "upload-c.png".into() }),
            ]
        );
        assert_eq!(
            blocks[1].children()[0],
            Block::paragraph(vec![RichTextSpan::styled(
                "Image unavailable: missing.png",
                Annotations::italic()
            )])
        );
        assert_eq!(diagnostics.into_entries().len(), 1);
    }

    #[tokio::test]
    async fn nothing_to_resolve() {
        let mut blocks = vec![Block::divider()];
        resolve_media(&mut blocks, &FakeResolver, &mut Diagnostics::new()).await;
        assert_eq!(blocks, vec![Block::divider()]);
    }
}
