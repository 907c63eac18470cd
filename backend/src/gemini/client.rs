//! Gemini API client
//!
//! Direct HTTP client for calling the Gemini API's `generateContent` method.
//! The call is non-streaming: the whole reply is materialized before it is
//! returned to the handler.

use crate::config::GeminiConfig;
use crate::gemini::types::{Content, GenerateContentRequest, GenerateContentResponse};
use crate::gemini::{GeminiError, TextGenerator};
use async_trait::async_trait;
use std::time::Duration;

/// Gemini REST client
///
/// Holds a shared `reqwest::Client` for connection pooling.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client from configuration
    pub fn new(config: &GeminiConfig) -> Result<Self, GeminiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Model this client talks to
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Call Gemini with an already assembled conversation
    ///
    /// # Returns
    /// * `Ok(String)` - The text content of the first candidate
    /// * `Err(GeminiError)` - If the API key is missing, the HTTP request fails,
    ///   the response cannot be parsed, the prompt was blocked, or no text came back
    pub async fn generate_content(&self, contents: Vec<Content>) -> Result<String, GeminiError> {
        if self.api_key.is_empty() {
            return Err(GeminiError::MissingApiKey);
        }

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let turns = contents.len();
        let request_body = GenerateContentRequest { contents };

        tracing::debug!(
            model = %self.model,
            turns = turns,
            "Calling Gemini API"
        );

        let response = self.http.post(&url).json(&request_body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());

            tracing::error!(
                status_code = status_code,
                error_body = %body,
                "Gemini API returned error status"
            );

            return Err(GeminiError::Status {
                status: status_code,
                body,
            });
        }

        let response_body = response.text().await?;

        let parsed: GenerateContentResponse = serde_json::from_str(&response_body)
            .map_err(|e| GeminiError::InvalidResponse(format!("{} - Response body: {}", e, response_body)))?;

        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_ref())
        {
            return Err(GeminiError::Blocked(reason.clone()));
        }

        let text = parsed.text().ok_or(GeminiError::EmptyResponse)?;

        tracing::debug!(
            response_len = text.len(),
            "Successfully received response from Gemini API"
        );

        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, contents: Vec<Content>) -> Result<String, GeminiError> {
        self.generate_content(contents).await
    }
}
