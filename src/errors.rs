//! Error types for both faces of the crate: the harness-side [`Error`]
//! surfaced by the client and probe, and the axum-facing [`AppError`]
//! the gateway handlers convert into HTTP responses.

use crate::gateway::store::StoreError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::{fmt, path::PathBuf};
use thiserror::Error;

/// Harness-side result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the client object model and the mount probe.
///
/// None of these are recovered anywhere in the harness: they propagate
/// with `?` and fail the enclosing scenario.
#[derive(Debug, Error)]
pub enum Error {
    /// The gateway rejected the credentials during the auth handshake.
    #[error("authentication rejected by the gateway")]
    Auth,

    /// A storage request was attempted before `authenticate()`.
    #[error("connection is not authenticated")]
    Unauthenticated,

    /// Any non-2xx response to a storage request.
    #[error("unexpected status {status} for {url}: {body}")]
    Response {
        status: StatusCode,
        url: String,
        body: String,
    },

    /// Recursive traversal exceeded the depth bound.
    #[error("too deep recursion at {}", path.display())]
    TooDeep { path: PathBuf },

    /// The configured locale tag did not parse or has no collation data.
    #[error("invalid locale tag `{0}`")]
    Locale(String),

    /// A response payload or header set did not have the expected shape.
    #[error("malformed response: {0}")]
    Listing(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Xml(#[from] quick_xml::DeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Error surface of the gateway handlers: an HTTP status from the
/// Swift wire contract plus a short reason, rendered as a JSON error
/// document.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    reason: String,
}

impl AppError {
    pub fn new(status: StatusCode, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }

    /// 500 for failures the Swift surface has no better status for.
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, reason)
    }

    /// 404 for a missing account, container, or object.
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, reason)
    }

    /// 401 for bad credentials and for missing or expired tokens.
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, reason)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.reason)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = Json(json!({
            "status": status.as_u16(),
            "reason": self.reason,
        }));
        (status, body).into_response()
    }
}

/// Swift status mapping for store failures: 404 for anything missing,
/// 409 for deletes blocked by children, 400 for malformed names, 412
/// when a declared versions container does not exist.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            StoreError::ContainerNotFound(_) | StoreError::ObjectNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            StoreError::ContainerNotEmpty(_) | StoreError::DirectoryNotEmpty(_) => {
                StatusCode::CONFLICT
            }
            StoreError::InvalidContainerName { .. } | StoreError::InvalidObjectKey => {
                StatusCode::BAD_REQUEST
            }
            StoreError::VersionsContainerMissing(_) => StatusCode::PRECONDITION_FAILED,
            StoreError::TooDeep | StoreError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}
