//! HTTP error responses
//!
//! Every handler failure ends up as one of these variants. The message is
//! the whole response body, as plain text; backend details are logged, not
//! sent to the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors returned by the request handlers
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Storage is switched off by configuration
    #[error("Is not active")]
    Inactive,

    /// The requested object does not exist
    #[error("File not found")]
    FileNotFound,

    /// Any other failure while reading an object
    #[error("Error find file")]
    FindFailed,

    /// The bucket listing failed
    #[error("Error list files")]
    ListFailed,

    /// A multipart upload without a file field
    #[error("File is required")]
    MissingFile,

    /// Route segments or upload body could not be used
    #[error("{0}")]
    BadRequest(String),

    /// Backend failure during upload or delete
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// HTTP status code for this error
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Inactive
            | Self::FileNotFound
            | Self::FindFailed
            | Self::ListFailed
            | Self::MissingFile
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
