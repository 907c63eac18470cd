//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP responses.
//! All errors implement `IntoResponse` and render as `{"reply": "..."}` so the
//! chat front end can show them in place of a model reply.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Reply sent when the upstream call fails
pub const UPSTREAM_FAILURE_REPLY: &str = "Something went wrong";

/// Reply sent when the upstream call succeeds without any text
pub const EMPTY_REPLY: &str = "No response from AI";

/// Reply sent when neither a message nor a file is present
pub const MESSAGE_REQUIRED_REPLY: &str = "Message is required when no files are attached";

/// Application-level error types
///
/// All errors that can occur while serving a chat request are represented by this enum.
/// Each variant implements automatic conversion to HTTP responses via `IntoResponse`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Neither a message nor an attachment was provided
    #[error("{}", MESSAGE_REQUIRED_REPLY)]
    MessageRequired,

    /// Request body could not be parsed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Attachment MIME type is not in the allow-list
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Attachment exceeds the per-file size limit
    #[error("File '{name}' exceeds the maximum size of {limit} bytes")]
    FileTooLarge {
        /// Name of the offending file
        name: String,
        /// Configured limit in bytes
        limit: usize,
    },

    /// More attachments than allowed
    #[error("Too many files: at most {0} files can be attached")]
    TooManyFiles(usize),

    /// The provider call failed
    #[error("Upstream error: {0}")]
    Upstream(#[from] crate::gemini::GeminiError),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MessageRequired
            | AppError::InvalidRequest(_)
            | AppError::UnsupportedFileType(_)
            | AppError::FileTooLarge { .. }
            | AppError::TooManyFiles(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text placed in the `reply` field
    ///
    /// Client errors carry their reason; server errors carry a generic message
    /// and never upstream detail.
    pub fn reply_text(&self) -> String {
        match self {
            AppError::Upstream(crate::gemini::GeminiError::EmptyResponse) => EMPTY_REPLY.to_string(),
            AppError::Upstream(_) | AppError::Internal(_) => UPSTREAM_FAILURE_REPLY.to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Chat request failed");
        }

        let body = Json(json!({
            "reply": self.reply_text(),
        }));

        (status, body).into_response()
    }
}
