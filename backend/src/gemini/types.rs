//! Gemini API request and response types
//!
//! Structs that mirror the Gemini REST JSON format for `generateContent`.

use serde::{Deserialize, Serialize};

/// Role of a turn in the conversation sent upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Turn written by the person chatting
    User,
    /// Turn written by the model
    Model,
}

/// Request structure for `generateContent`
#[derive(Serialize, Debug)]
pub struct GenerateContentRequest {
    /// Ordered conversation turns
    pub contents: Vec<Content>,
}

/// A single conversation turn
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Content {
    /// Author of the turn
    pub role: Role,
    /// Parts making up the turn
    pub parts: Vec<Part>,
}

impl Content {
    /// A turn made of a single text part
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::Text { text: text.into() }],
        }
    }
}

/// A single part of a turn
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Part {
    /// Plain text
    Text {
        /// The text content
        text: String,
    },
    /// Binary payload sent inline
    InlineData {
        /// Base64 payload tagged with its MIME type
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

/// Inline binary payload
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// MIME type of the decoded payload
    pub mime_type: String,
    /// Standard base64 encoding of the payload
    pub data: String,
}

/// Top-level `generateContent` response
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// List of candidate responses from the model
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Optional feedback about the prompt (e.g., if it was blocked)
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it has any
    pub fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let content = candidate.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// A single candidate response from the model
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The content of this candidate (absent when generation was stopped early)
    #[serde(default)]
    pub content: Option<ResponseContent>,
    /// Why the model stopped generating (if applicable)
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Content structure containing parts of the response
#[derive(Deserialize, Debug)]
pub struct ResponseContent {
    /// List of content parts
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

/// A single part of response content
#[derive(Deserialize, Debug)]
pub struct ResponsePart {
    /// Text of this part; non-text parts leave it empty
    #[serde(default)]
    pub text: Option<String>,
}

/// Feedback about the prompt (e.g., if it was blocked)
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Reason the prompt was blocked (if applicable)
    #[serde(default)]
    pub block_reason: Option<String>,
}
