//! Gemini provider module
//!
//! Direct HTTP access to the Gemini `generateContent` API, behind the
//! [`TextGenerator`] trait so handlers can be exercised without the network.

pub mod client;
pub mod types;

pub use client::GeminiClient;
pub use types::{Content, InlineData, Part, Role};

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while talking to the provider
#[derive(Error, Debug)]
pub enum GeminiError {
    /// No API key configured
    #[error("API key is empty")]
    MissingApiKey,

    /// Request could not be sent or the body could not be read
    #[error("HTTP request to Gemini API failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("Gemini API returned error status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Raw error body
        body: String,
    },

    /// Response body was not the expected JSON
    #[error("Failed to parse JSON response from Gemini API: {0}")]
    InvalidResponse(String),

    /// Provider refused the prompt
    #[error("Gemini API blocked the prompt: {0}")]
    Blocked(String),

    /// Provider answered without any text
    #[error("Gemini API response contains no text")]
    EmptyResponse,
}

/// Something that turns an assembled conversation into reply text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate the complete reply for `contents`
    ///
    /// Implementations return [`GeminiError::EmptyResponse`] rather than an
    /// empty string.
    async fn generate(&self, contents: Vec<Content>) -> Result<String, GeminiError>;
}
