//! Domain-specific newtypes for type safety and validation.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// API key for Notion API authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Create a new API key with validation
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into();

        if key.is_empty() {
            return Err(ValidationError::InvalidApiKey {
                reason: "API key cannot be empty".to_string(),
            });
        }

        if !key.starts_with("secret_") && !key.starts_with("ntn_") {
            return Err(ValidationError::InvalidApiKey {
                reason: "API key must start with 'secret_' or 'ntn_'".to_string(),
            });
        }

        if key.len() < 20 {
            return Err(ValidationError::InvalidApiKey {
                reason: "API key is too short".to_string(),
            });
        }

        Ok(Self(key))
    }

    /// Get the API key as a string reference
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}...", &self.0[..10])
    }
}

/// An absolute http(s) URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUrl(Url);

impl Serialize for ValidatedUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ValidatedUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ValidatedUrl::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl ValidatedUrl {
    /// Create a new validated URL
    pub fn parse(url: &str) -> Result<Self, ValidationError> {
        let parsed = Url::parse(url.trim()).map_err(|e| ValidationError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_url(parsed)
    }

    /// Resolves `reference` (possibly relative or protocol-relative)
    /// against an optional base page URL.
    pub fn resolve(base: Option<&ValidatedUrl>, reference: &str) -> Result<Self, ValidationError> {
        let reference = reference.trim();
        match base {
            Some(base) => {
                let joined = base.0.join(reference).map_err(|e| ValidationError::InvalidUrl {
                    url: reference.to_string(),
                    reason: e.to_string(),
                })?;
                Self::from_url(joined)
            }
            None if reference.starts_with("//") => Self::parse(&format!("https:{}", reference)),
            None => Self::parse(reference),
        }
    }

    fn from_url(url: Url) -> Result<Self, ValidationError> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ValidationError::InvalidUrl {
                url: url.to_string(),
                reason: "Only HTTP and HTTPS URLs are supported".to_string(),
            });
        }
        Ok(Self(url))
    }

    /// Get the URL as a string
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Last non-empty path segment, used when naming media in placeholders.
    pub fn file_name(&self) -> Option<&str> {
        self.0
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
    }
}

impl fmt::Display for ValidatedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The name of a property on a Notion page or database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyName(String);

impl PropertyName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PropertyName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Severity of a diagnostic recorded during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Info,
    Warning,
    Error,
}

/// One structured entry written to the diagnostics sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    /// The block type (and position, when known) the entry refers to.
    pub block: Option<String>,
}

impl Diagnostic {
    pub fn new(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            block: None,
        }
    }

    pub fn with_block(mut self, block: impl Into<String>) -> Self {
        self.block = Some(block.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.level, self.message)?;
        if let Some(block) = &self.block {
            write!(f, " ({})", block)?;
        }
        Ok(())
    }
}

/// Write-only diagnostics sink.
///
/// Every entry is forwarded to `log` as it is recorded and kept for the
/// extraction report; nothing in the conversion path reads entries back.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, diagnostic: Diagnostic) {
        match diagnostic.level {
            DiagnosticLevel::Info => log::debug!("{}", diagnostic),
            DiagnosticLevel::Warning => log::warn!("{}", diagnostic),
            DiagnosticLevel::Error => log::error!("{}", diagnostic),
        }
        self.entries.push(diagnostic);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record(Diagnostic::new(DiagnosticLevel::Info, message));
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.record(Diagnostic::new(DiagnosticLevel::Warning, message));
    }

    pub fn warn_block(&mut self, block: &str, message: impl Into<String>) {
        self.record(Diagnostic::new(DiagnosticLevel::Warning, message).with_block(block));
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_validation() {
        assert!(ApiKey::new("secret_abcdefghijklmnopqrs").is_ok());
        assert!(ApiKey::new("ntn_abcdefghijklmnopqrs").is_ok());
        assert!(ApiKey::new("").is_err());
        assert!(ApiKey::new("invalid_key").is_err());
        assert!(ApiKey::new("secret_short").is_err());
    }

    #[test]
    fn test_url_validation() {
        assert!(ValidatedUrl::parse("https://docs.servicenow.com/page").is_ok());
        assert!(ValidatedUrl::parse("ftp://example.com").is_err());
        assert!(ValidatedUrl::parse("not a url").is_err());
    }

    #[test]
    fn test_url_resolution() {
        let base = ValidatedUrl::parse("https://docs.servicenow.com/bundle/r/page.html").unwrap();
        let img = ValidatedUrl::resolve(Some(&base), "../image/flow.png").unwrap();
        assert_eq!(img.as_str(), "https://docs.servicenow.com/bundle/image/flow.png");
        assert_eq!(img.file_name(), Some("flow.png"));

        let protocol_relative = ValidatedUrl::resolve(None, "//cdn.example.com/a.png").unwrap();
        assert_eq!(protocol_relative.as_str(), "https://cdn.example.com/a.png");

        assert!(ValidatedUrl::resolve(None, "relative/only.png").is_err());
        assert!(ValidatedUrl::resolve(Some(&base), "javascript:void(0)").is_err());
    }

    #[test]
    fn test_diagnostics_keep_entries() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn_block("table", "row padded");
        diagnostics.info("done");
        let entries = diagnostics.into_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].block.as_deref(), Some("table"));
        assert_eq!(entries[0].to_string(), "[Warning] row padded (table)");
    }
}
