// src/api/resolver.rs
//! Media resolution without uploads: images are hotlinked from their source.

use crate::error::MediaUnavailable;
use crate::pipeline::{MediaReference, MediaResolver};
use crate::types::ValidatedUrl;

/// Resolves images to external references after validating their URLs.
///
/// Relative URLs are resolved against `base_url` when one is set.
#[derive(Debug, Clone, Default)]
pub struct ExternalMediaResolver {
    base_url: Option<ValidatedUrl>,
}

impl ExternalMediaResolver {
    pub fn new(base_url: Option<ValidatedUrl>) -> Self {
        Self { base_url }
    }
}

#[async_trait::async_trait]
impl MediaResolver for ExternalMediaResolver {
    async fn resolve(&self, url: &str) -> Result<MediaReference, MediaUnavailable> {
        if url.starts_with("data:") {
            return Err(MediaUnavailable {
                url: url.chars().take(40).collect(),
                reason: "inline data URIs cannot be referenced externally".to_string(),
            });
        }
        let resolved = ValidatedUrl::resolve(self.base_url.as_ref(), url).map_err(|e| {
            MediaUnavailable {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(MediaReference::External {
            url: resolved.as_str().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn relative_urls_resolve_against_the_base() {
        let base = ValidatedUrl::parse("https://docs.servicenow.com/bundle/r/page.html").unwrap();
        let resolver = ExternalMediaResolver::new(Some(base));

        let reference = resolver.resolve("../image/flow.png").await.unwrap();
        assert_eq!(
            reference,
            MediaReference::External {
                url: "https://docs.servicenow.com/bundle/image/flow.png".to_string()
            }
        );
    }

    #[tokio::test]
    async fn unusable_urls_are_unavailable() {
        let resolver = ExternalMediaResolver::default();
        assert!(resolver.resolve("image/flow.png").await.is_err());
        assert!(resolver
            .resolve("data:image/png;base64,iVBORw0KGgo=")
            .await
            .is_err());
    }
}
