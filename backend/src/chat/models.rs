//! Chat data models
//!
//! Defines the wire structures of the `/api/chat` endpoint.

use crate::error::AppError;
use crate::gemini::Role;
use serde::{Deserialize, Serialize};

/// One prior message supplied by the caller as context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// `user` for the person chatting; any other value is treated as the model
    pub sender: String,
    /// Message text (may be empty for attachment-only messages)
    #[serde(default)]
    pub text: String,
}

impl HistoryEntry {
    /// Create a history entry
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
        }
    }

    /// Upstream role for this entry's sender
    pub fn role(&self) -> Role {
        if self.sender == "user" {
            Role::User
        } else {
            Role::Model
        }
    }
}

/// File uploaded with the current message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Display name (original file name)
    pub name: String,
    /// Declared MIME type
    pub mime_type: String,
    /// Raw file contents
    pub data: Vec<u8>,
}

/// A fully parsed chat request, independent of the body encoding
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// Text of the in-flight message
    pub message: String,
    /// Prior messages, oldest first, excluding the in-flight message
    pub history: Vec<HistoryEntry>,
    /// Files attached to the in-flight message
    pub attachments: Vec<Attachment>,
    /// Explicit stream flag, if the caller sent one
    pub stream: Option<bool>,
}

/// JSON body of `POST /api/chat`
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequestBody {
    /// Text of the in-flight message
    #[serde(default)]
    pub message: Option<String>,
    /// Prior messages
    #[serde(default)]
    pub history: Option<Vec<HistoryEntry>>,
    /// Stream flag as a boolean or `"true"` / `"false"`
    #[serde(default)]
    pub stream: Option<StreamFlag>,
}

impl TryFrom<ChatRequestBody> for ChatRequest {
    type Error = AppError;

    fn try_from(body: ChatRequestBody) -> Result<Self, Self::Error> {
        Ok(Self {
            message: body.message.unwrap_or_default(),
            history: body.history.unwrap_or_default(),
            attachments: Vec::new(),
            stream: body.stream.map(|s| s.resolve()).transpose()?,
        })
    }
}

/// The `stream` field accepts a JSON boolean or its string spelling
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StreamFlag {
    /// `true` / `false`
    Bool(bool),
    /// `"true"` / `"false"`
    Text(String),
}

impl StreamFlag {
    /// Resolve to a boolean, rejecting anything but true/false spellings
    pub fn resolve(self) -> Result<bool, AppError> {
        match self {
            StreamFlag::Bool(b) => Ok(b),
            StreamFlag::Text(s) => parse_stream_text(&s),
        }
    }
}

/// Parse the textual form of the stream flag
pub fn parse_stream_text(value: &str) -> Result<bool, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(AppError::InvalidRequest(format!(
            "'stream' must be true or false, got '{}'",
            other
        ))),
    }
}

/// Non-streamed response body (also used for errors)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Model reply or error reason
    pub reply: String,
}
