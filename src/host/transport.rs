//! Transport Layer
//!
//! Abstracts the HTTP connection for testability. Provides:
//! - Transport trait: interface for one request/response exchange
//! - MockTransport: in-process mock server for unit tests
//! - HttpTransport (see `http.rs`): real HTTP connection for production

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use portal_protocol::{ErrorBody, Method};

use crate::mock::MockServer;

/// A single request to the portal backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the server root, including any query string
    pub path: String,
    /// Serialized JSON body, sent with `Content-Type: application/json`
    pub body: Option<String>,
}

impl HttpRequest {
    /// Create a request without a body
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    /// Attach a JSON body
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, TransportError> {
        self.body = Some(serde_json::to_string(body)?);
        Ok(self)
    }

    /// Path without the query string
    pub fn route(&self) -> &str {
        self.path.split('?').next().unwrap_or(&self.path)
    }

    /// Look up a query parameter by name
    pub fn query_param(&self, name: &str) -> Option<&str> {
        let (_, query) = self.path.split_once('?')?;
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }

    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        let body = self.body.as_deref().unwrap_or("null");
        Ok(serde_json::from_str(body)?)
    }
}

/// Response to an [`HttpRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: String,
}

impl HttpResponse {
    /// Create a response with a raw body
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Create a response with a JSON body
    pub fn json_body<T: Serialize>(status: u16, body: &T) -> Self {
        Self {
            status,
            body: serde_json::to_string(body).unwrap_or_default(),
        }
    }

    /// Returns true for statuses in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Message carried by a JSON error body, if present
    pub fn error_message(&self) -> Option<String> {
        ErrorBody::parse(&self.body).and_then(|b| b.user_message())
    }
}

/// Transport trait for portal requests
///
/// A transport reports a response for every status code; only failures to
/// complete the exchange at all are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and wait for its response
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection timeout")]
    ConnectionTimeout,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request error: {0}")]
    Request(String),
}

/// Mock transport for testing - connects directly to MockServer in-process
pub struct MockTransport {
    server: MockServer,
}

impl MockTransport {
    /// Create a new mock transport with a fresh mock server
    pub fn new() -> Self {
        Self {
            server: MockServer::new(),
        }
    }

    /// Create a mock transport with a pre-configured server
    pub fn with_server(server: MockServer) -> Self {
        Self { server }
    }

    /// Get a reference to the underlying mock server for test configuration
    pub fn server(&self) -> &MockServer {
        &self.server
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.server.handle(request).await
    }
}
