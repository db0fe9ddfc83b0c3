// src/api/client.rs
//! Thin HTTP client for the Notion API.
//!
//! Handles authentication headers and maps non-success responses to
//! [`PersistenceError`]; knows nothing about pages or blocks.

use crate::constants::{NOTION_API_BASE_URL, NOTION_API_VERSION};
use crate::error::{AppError, NotionErrorCode, PersistenceError};
use crate::types::ApiKey;
use notion_client::objects::error::Error as NotionError;
use reqwest::{header, Client, Method, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;

/// A thin wrapper around reqwest Client for Notion API requests.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    base_url: String,
}

impl NotionHttpClient {
    /// Creates a new HTTP client with Notion API authentication.
    pub fn new(api_key: &ApiKey) -> Result<Self, AppError> {
        Self::with_base_url(api_key, NOTION_API_BASE_URL)
    }

    /// Same as [`NotionHttpClient::new`] against another API root.
    pub fn with_base_url(api_key: &ApiKey, base_url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(api_key)?)
            .build()
            .map_err(|e| AppError::NetworkFailure(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Creates the default headers for Notion API requests.
    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", api_key.as_str());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid API token format: {}", e))
            })?,
        );

        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_static(NOTION_API_VERSION),
        );

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    /// Makes a GET request and returns the decoded JSON body.
    pub async fn get(&self, endpoint: &str) -> Result<Value, PersistenceError> {
        self.send::<()>(Method::GET, endpoint, None).await
    }

    /// Makes a POST request with JSON body and returns the decoded JSON body.
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<Value, PersistenceError> {
        self.send(Method::POST, endpoint, Some(body)).await
    }

    /// Makes a PATCH request with JSON body and returns the decoded JSON body.
    pub async fn patch<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<Value, PersistenceError> {
        self.send(Method::PATCH, endpoint, Some(body)).await
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&T>,
    ) -> Result<Value, PersistenceError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        log::debug!("{} {}", method, url);

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(transport_error)?;
        decode_response(response).await
    }
}

#[async_trait::async_trait]
impl super::NotionApi for NotionHttpClient {
    async fn get(&self, endpoint: &str) -> Result<Value, PersistenceError> {
        NotionHttpClient::get(self, endpoint).await
    }

    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, PersistenceError> {
        NotionHttpClient::post(self, endpoint, body).await
    }

    async fn patch(&self, endpoint: &str, body: &Value) -> Result<Value, PersistenceError> {
        NotionHttpClient::patch(self, endpoint, body).await
    }
}

async fn decode_response(response: Response) -> Result<Value, PersistenceError> {
    let status = response.status();
    let text = response.text().await.map_err(transport_error)?;
    if status.is_success() {
        return serde_json::from_str(&text).map_err(|e| {
            PersistenceError::MalformedResponse(format!("{} (HTTP {})", e, status.as_u16()))
        });
    }
    Err(parse_error_body(status, &text))
}

fn transport_error(err: reqwest::Error) -> PersistenceError {
    if err.is_timeout() {
        PersistenceError::Timeout(err.to_string())
    } else {
        PersistenceError::Transport(err)
    }
}

/// Maps an error response to a typed rejection.
///
/// Notion's error object carries a machine-readable `code`; when the body
/// is not one, the HTTP status stands in for it.
pub(crate) fn parse_error_body(status: StatusCode, body: &str) -> PersistenceError {
    match serde_json::from_str::<NotionError>(body) {
        Ok(error) => PersistenceError::Rejected {
            code: NotionErrorCode::from_api_response(&error.code),
            message: error.message,
            status: status.as_u16(),
        },
        Err(_) => PersistenceError::Rejected {
            code: NotionErrorCode::from_http_status(status.as_u16()),
            message: format!("HTTP {}", status),
            status: status.as_u16(),
        },
    }
}
