//! Chat proxy API
//!
//! `POST /api/chat` accepts a message, optional history, optional files and
//! an optional stream flag, forwards the assembled conversation to Gemini and
//! answers with JSON or a paced plain-text body.
//!
//! The body can be JSON or `multipart/form-data`; files are only accepted in
//! the multipart form. The server keeps no conversation state between calls.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::time::Duration;
use tracing::{info, warn};

use crate::api::streaming::create_text_stream;
use crate::api::utils::{
    is_allowed_mime_type, mime_essence, validate_attachment, validate_chat_request,
};
use crate::chat::models::{parse_stream_text, ChatRequestBody, HistoryEntry};
use crate::chat::prompt::build_contents;
use crate::chat::{Attachment, ChatReply, ChatRequest};
use crate::config::UploadConfig;
use crate::error::AppError;
use crate::gemini::GeminiError;
use crate::state::AppState;

/// Fallback MIME type for file parts that do not declare one
const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// Chat request extracted from either body encoding
#[derive(Debug)]
pub struct ChatInput(pub ChatRequest);

#[async_trait]
impl FromRequest<AppState> for ChatInput {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::InvalidRequest(e.body_text()))?;
            let request = parse_multipart(multipart, &state.config.uploads).await?;
            return Ok(ChatInput(request));
        }

        let is_json = is_json_content_type(&content_type);
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::InvalidRequest(e.body_text()))?;

        // A missing, empty or non-JSON body reads as `{}`
        let body = if is_json && !bytes.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_slice::<ChatRequestBody>(&bytes).map_err(|e| {
                AppError::InvalidRequest(format!(
                    "Failed to parse the request body as JSON: {}",
                    e
                ))
            })?
        } else {
            ChatRequestBody::default()
        };
        Ok(ChatInput(ChatRequest::try_from(body)?))
    }
}

/// `application/json` or any `+json` media type
fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    essence == "application/json" || essence.ends_with("+json")
}

/// Read a multipart chat form
///
/// Accepts these fields:
/// - message: text message
/// - history: JSON array of `{sender, text}`
/// - stream: `true` / `false`
/// - files: one or more uploaded files
///
/// File parts are checked as they arrive so a disallowed type or an
/// oversized upload is rejected without buffering the rest of the form.
pub async fn parse_multipart(
    mut multipart: Multipart,
    limits: &UploadConfig,
) -> Result<ChatRequest, AppError> {
    let mut request = ChatRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "message" => {
                request.message = field.text().await.map_err(|e| {
                    AppError::InvalidRequest(format!("Failed to read message field: {}", e))
                })?;
            }
            "history" => {
                let raw = field.text().await.map_err(|e| {
                    AppError::InvalidRequest(format!("Failed to read history field: {}", e))
                })?;
                if !raw.trim().is_empty() {
                    request.history = serde_json::from_str::<Vec<HistoryEntry>>(&raw).map_err(|e| {
                        AppError::InvalidRequest(format!("Invalid history: {}", e))
                    })?;
                }
            }
            "stream" => {
                let raw = field.text().await.map_err(|e| {
                    AppError::InvalidRequest(format!("Failed to read stream field: {}", e))
                })?;
                if !raw.trim().is_empty() {
                    request.stream = Some(parse_stream_text(&raw)?);
                }
            }
            "files" | "files[]" => {
                if request.attachments.len() >= limits.max_files {
                    return Err(AppError::TooManyFiles(limits.max_files));
                }

                let name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("file-{}", request.attachments.len() + 1));
                let mime_type = mime_essence(field.content_type().unwrap_or(UNKNOWN_MIME_TYPE));

                if !is_allowed_mime_type(&mime_type) {
                    return Err(AppError::UnsupportedFileType(format!(
                        "'{}' ({})",
                        name, mime_type
                    )));
                }

                let data = field.bytes().await.map_err(|e| {
                    AppError::InvalidRequest(format!("Failed to read file '{}': {}", name, e))
                })?;

                let attachment = Attachment {
                    name,
                    mime_type,
                    data: data.to_vec(),
                };
                validate_attachment(&attachment, limits)?;

                info!(
                    file_name = %attachment.name,
                    mime_type = %attachment.mime_type,
                    size = attachment.data.len(),
                    "Received uploaded file"
                );
                request.attachments.push(attachment);
            }
            _ => {
                warn!("Unknown multipart field: {}", field_name);
            }
        }
    }

    Ok(request)
}

/// Chat endpoint
///
/// This endpoint:
/// 1. Validates the message / attachments
/// 2. Assembles priming turns, history and the current turn
/// 3. Calls Gemini once and waits for the complete reply
/// 4. Returns `{reply}` or streams the reply one character at a time
pub async fn chat(
    State(state): State<AppState>,
    ChatInput(request): ChatInput,
) -> Result<Response, AppError> {
    validate_chat_request(&request, &state.config.uploads)?;

    let stream = request
        .stream
        .unwrap_or(state.config.chat.stream_by_default);

    info!(
        message_len = request.message.len(),
        history_len = request.history.len(),
        attachments = request.attachments.len(),
        stream = stream,
        "Chat request received"
    );

    let contents = build_contents(&state.config.chat, &request);
    let reply = state.generator.generate(contents).await?;
    if reply.trim().is_empty() {
        return Err(GeminiError::EmptyResponse.into());
    }

    info!(response_len = reply.len(), "Upstream reply received");

    if stream {
        let delay = Duration::from_millis(state.config.chat.stream_char_delay_ms);
        create_text_stream(reply, delay)
    } else {
        Ok(Json(ChatReply { reply }).into_response())
    }
}
