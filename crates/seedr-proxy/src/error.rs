//! Error types for the proxy

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{FormRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Result type alias for proxy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Body returned for every fault that is not the caller's doing
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred.";

/// Body returned when a job id has no status record
pub const JOB_NOT_FOUND_MESSAGE: &str = "Job not found";

/// Body returned when `item_type` is neither `file` nor `folder`
pub const INVALID_ITEM_TYPE_MESSAGE: &str = "Invalid item_type. Must be 'file' or 'folder'.";

/// Body returned when an upload exceeds the configured size limit
pub const UPLOAD_TOO_LARGE_MESSAGE: &str = "Upload exceeds the maximum allowed size.";

/// One entry of a 422 response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDetail {
    /// Where the bad input lives, e.g. `["body", "magnet"]`
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ValidationDetail {
    /// A required field that was not supplied
    pub fn missing(location: &str, field: &str) -> Self {
        Self {
            loc: vec![location.to_string(), field.to_string()],
            msg: "Field required".to_string(),
            kind: "missing".to_string(),
        }
    }
}

/// Proxy errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Saving the uploaded bytes to local storage failed
    #[error("Failed to stage upload '{filename}': {message}")]
    Staging { filename: String, message: String },

    /// Status record could not be read or written
    #[error("Status store error: {0}")]
    StatusStore(String),

    /// Remote storage provider failure
    #[error("Remote storage error: {0}")]
    Remote(String),

    /// Job id has no status record
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Unsupported `item_type` on delete
    #[error("Invalid item_type: {0}")]
    InvalidItemType(String),

    /// Request failed validation
    #[error("Request validation failed: {0:?}")]
    Validation(Vec<ValidationDetail>),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Upload body went over the size limit
    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    /// HTTP request error, with the request URL stripped
    #[error("HTTP request error: {0}")]
    Http(reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a staging error
    pub fn staging(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Staging {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a status store error
    pub fn status_store(message: impl Into<String>) -> Self {
        Self::StatusStore(message.into())
    }

    /// Create a remote storage error
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(message.into())
    }

    /// Create a single-entry validation error
    pub fn validation(loc: &[&str], msg: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::Validation(vec![ValidationDetail {
            loc: loc.iter().map(|s| s.to_string()).collect(),
            msg: msg.into(),
            kind: kind.into(),
        }])
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::JobNotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidItemType(_) => StatusCode::BAD_REQUEST,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Seedr URLs carry the access token in the query string
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.without_url())
    }
}

impl From<FormRejection> for Error {
    fn from(rejection: FormRejection) -> Self {
        Error::validation(&["body"], rejection.body_text(), "form")
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::validation(&["query"], rejection.body_text(), "query")
    }
}

impl From<MultipartRejection> for Error {
    fn from(rejection: MultipartRejection) -> Self {
        Error::validation(&["body"], rejection.body_text(), "multipart")
    }
}

impl From<MultipartError> for Error {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Error::PayloadTooLarge(err.body_text());
        }
        Error::validation(&["body"], err.body_text(), "multipart")
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Error::JobNotFound(id) => {
                tracing::debug!(job_id = %id, "Status requested for unknown job");
                json!({ "error": JOB_NOT_FOUND_MESSAGE })
            }
            Error::InvalidItemType(item_type) => {
                tracing::debug!(item_type = %item_type, "Rejected delete with invalid item_type");
                json!({ "error": INVALID_ITEM_TYPE_MESSAGE })
            }
            Error::Validation(details) => json!({ "detail": details }),
            Error::PayloadTooLarge(detail) => {
                tracing::warn!("Rejected upload: {}", detail);
                json!({ "error": UPLOAD_TOO_LARGE_MESSAGE })
            }
            other => {
                tracing::error!(error = %other, "An unhandled exception occurred");
                json!({ "message": INTERNAL_ERROR_MESSAGE })
            }
        };

        (status, Json(body)).into_response()
    }
}
