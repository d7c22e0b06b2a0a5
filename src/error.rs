//! Error types for the virtual filesystem server
//!
//! Provides unified error handling using thiserror. The cache and worker pool
//! never fail; these variants come from path resolution, fingerprinting and
//! the filesystem operations built on top of them.

use std::io;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

// == Vfs Error Enum ==
/// Unified error type for the server.
#[derive(Error, Debug)]
pub enum VfsError {
    /// Traversal attempt, path outside every configured root, or malformed name
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// File or directory does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Target of a create already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Malformed or incomplete request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Payload exceeds a configured limit
    #[error("Too large: {0}")]
    TooLarge(String),

    /// Underlying filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A pooled task panicked or the pool was closed before it ran
    #[error("Task failed: {0}")]
    TaskFailed(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VfsError {
    /// Maps an I/O error on `path` to `NotFound` when the path is missing.
    pub fn from_io(err: io::Error, path: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => VfsError::NotFound(path.to_string()),
            io::ErrorKind::AlreadyExists => VfsError::AlreadyExists(path.to_string()),
            _ => VfsError::Io(err),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            VfsError::InvalidPath(_) | VfsError::BadRequest(_) => StatusCode::BAD_REQUEST,
            VfsError::NotFound(_) => StatusCode::NOT_FOUND,
            VfsError::AlreadyExists(_) => StatusCode::CONFLICT,
            VfsError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            VfsError::Io(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                StatusCode::FORBIDDEN
            }
            VfsError::Io(_) | VfsError::TaskFailed(_) | VfsError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for VfsError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the server.
pub type Result<T> = std::result::Result<T, VfsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            VfsError::InvalidPath("/..".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(VfsError::NotFound("/x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            VfsError::AlreadyExists("/x".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            VfsError::TooLarge("big".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            VfsError::TaskFailed("panic".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_io_classifies_kinds() {
        let missing = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert!(matches!(
            VfsError::from_io(missing, "/a"),
            VfsError::NotFound(p) if p == "/a"
        ));

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "no");
        let err = VfsError::from_io(denied, "/a");
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }
}
