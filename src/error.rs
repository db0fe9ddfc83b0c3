// src/error.rs
//! Application error types with structured error handling.
//!
//! Only one failure is fatal to extraction itself (`NoContentFound`);
//! structural anomalies and media failures are recorded as diagnostics
//! instead. Persistence errors come from the page writer and are passed
//! through unchanged.

use std::fmt;
use thiserror::Error;

/// Notion API error codes as a typed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotionErrorCode {
    /// API rate limit exceeded — back off and retry
    RateLimited,
    /// The requested object does not exist or is inaccessible
    ObjectNotFound,
    /// API key is invalid or expired
    Unauthorized,
    /// API key lacks permission for this resource
    RestrictedResource,
    /// Request body contains invalid JSON
    InvalidJson,
    /// Request parameters failed Notion's validation
    ValidationFailed,
    /// Conflict with current state of the resource
    Conflict,
    /// Notion internal server error
    InternalError,
    /// Notion is temporarily unavailable
    ServiceUnavailable,
    /// HTTP status code fallback when the error body is unparseable
    HttpStatus(u16),
    /// An error code this client doesn't recognize yet
    Unknown(String),
}

impl NotionErrorCode {
    /// Parse a Notion API error code string into the typed vocabulary.
    pub fn from_api_response(code: &str) -> Self {
        match code {
            "rate_limited" => Self::RateLimited,
            "object_not_found" => Self::ObjectNotFound,
            "unauthorized" => Self::Unauthorized,
            "restricted_resource" => Self::RestrictedResource,
            "invalid_json" => Self::InvalidJson,
            "validation_error" => Self::ValidationFailed,
            "conflict_error" => Self::Conflict,
            "internal_server_error" => Self::InternalError,
            "service_unavailable" => Self::ServiceUnavailable,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Create from an HTTP status code when the error body is unparseable.
    pub fn from_http_status(status: u16) -> Self {
        Self::HttpStatus(status)
    }

    /// Whether this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited | Self::ServiceUnavailable | Self::InternalError | Self::Conflict => {
                true
            }
            Self::HttpStatus(status) => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl fmt::Display for NotionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::ObjectNotFound => write!(f, "object_not_found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RestrictedResource => write!(f, "restricted_resource"),
            Self::InvalidJson => write!(f, "invalid_json"),
            Self::ValidationFailed => write!(f, "validation_error"),
            Self::Conflict => write!(f, "conflict_error"),
            Self::InternalError => write!(f, "internal_server_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// Failures reported by a page writer while persisting blocks.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Notion rejected the request ({code}, HTTP {status}): {message}")]
    Rejected {
        code: NotionErrorCode,
        message: String,
        status: u16,
    },

    #[error("Request to Notion timed out: {0}")]
    Timeout(String),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response from Notion: {0}")]
    MalformedResponse(String),
}

impl PersistenceError {
    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Rejected { code, .. } => code.is_retryable(),
            Self::Timeout(_) => true,
            Self::Transport(err) => err.is_timeout() || err.is_connect(),
            Self::MalformedResponse(_) => false,
        }
    }

    /// Whether a non-idempotent request can be sent again.
    ///
    /// A timed-out request may already have been applied, so only failures
    /// that happened before Notion acted on it qualify.
    pub fn is_safe_to_resend(&self) -> bool {
        match self {
            Self::Rejected { code, .. } => code.is_retryable(),
            Self::Transport(err) => err.is_connect() && !err.is_timeout(),
            Self::Timeout(_) | Self::MalformedResponse(_) => false,
        }
    }
}

/// A media reference could not be resolved. Never fatal to extraction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Media unavailable at {url}: {reason}")]
pub struct MediaUnavailable {
    pub url: String,
    pub reason: String,
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("No main content found (tried selectors: {})", selectors.join(", "))]
    NoContentFound { selectors: Vec<String> },

    #[error("Invalid content selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Failed to persist page: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Network request failed: {0}")]
    NetworkFailure(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] crate::types::ValidationError),

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl AppError {
    /// Whether the error means the capture itself had nothing to convert.
    pub fn is_no_content(&self) -> bool {
        matches!(self, AppError::NoContentFound { .. })
    }
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;
