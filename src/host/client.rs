//! Typed portal client
//!
//! Thin wrapper over a [`Transport`] for the read-only endpoints, plus the
//! error taxonomy shared by the workflow and the CLI.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use portal_protocol::{Endpoint, Method, SessionUser, UserList, UserSummary, ValidationRuleSet};

use super::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::storage::StorageError;

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Server rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failure taxonomy; the discriminant is the CLI exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input refused before any request was made
    Validation = 2,
    /// Server answered with a non-2xx status
    ServerRejection = 3,
    /// The request could not complete
    Transport = 4,
}

impl ErrorKind {
    pub fn exit_code(&self) -> i32 {
        *self as i32
    }
}

impl ClientError {
    /// Build a rejection from a non-2xx response
    pub fn rejected(response: &HttpResponse) -> Self {
        ClientError::Rejected {
            status: response.status,
            message: response
                .error_message()
                .unwrap_or_else(|| format!("HTTP {}", response.status)),
        }
    }

    /// Map error to failure kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Rejected { .. } => ErrorKind::ServerRejection,
            ClientError::Transport(_) | ClientError::Decode(_) | ClientError::Storage(_) => {
                ErrorKind::Transport
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Portal client
#[derive(Clone)]
pub struct PortalClient {
    transport: Arc<dyn Transport>,
}

impl PortalClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Send a request, turning non-2xx responses into [`ClientError::Rejected`]
    pub async fn send(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(ClientError::rejected(&response))
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: Endpoint) -> ClientResult<T> {
        let response = self
            .send(HttpRequest::new(Method::Get, endpoint.path()))
            .await?;
        debug!(%endpoint, status = response.status, "decoding response");
        response
            .json()
            .map_err(|e| ClientError::Decode(format!("{}: {}", endpoint, e)))
    }

    /// `GET /validation-rules`
    pub async fn validation_rules(&self) -> ClientResult<ValidationRuleSet> {
        self.get_json(Endpoint::ValidationRules).await
    }

    /// `GET /me`
    pub async fn me(&self) -> ClientResult<SessionUser> {
        self.get_json(Endpoint::Me).await
    }

    /// `GET /admin/user`
    pub async fn users(&self) -> ClientResult<Vec<UserSummary>> {
        let list: UserList = self.get_json(Endpoint::AdminUser).await?;
        Ok(list.users)
    }
}
