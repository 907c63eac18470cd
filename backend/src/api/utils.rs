//! API utility functions
//!
//! Contains helper functions used by the chat handler for request validation.

use crate::chat::{Attachment, ChatRequest};
use crate::config::{UploadConfig, ALLOWED_MIME_TYPES};
use crate::error::AppError;

/// Check whether a MIME type is in the upload allow-list
///
/// Parameters such as `; charset=utf-8` are ignored.
pub fn is_allowed_mime_type(mime_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime_essence(mime_type).as_str())
}

/// Lowercased media type without parameters: `Text/Plain; charset=utf-8` → `text/plain`
pub fn mime_essence(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Validate a single uploaded file
///
/// # Returns
/// * `Ok(())` - The file can be forwarded
/// * `Err(AppError)` - Disallowed MIME type or file too large
pub fn validate_attachment(attachment: &Attachment, limits: &UploadConfig) -> Result<(), AppError> {
    if !is_allowed_mime_type(&attachment.mime_type) {
        return Err(AppError::UnsupportedFileType(format!(
            "'{}' ({})",
            attachment.name, attachment.mime_type
        )));
    }
    if attachment.data.len() > limits.max_file_size_bytes {
        return Err(AppError::FileTooLarge {
            name: attachment.name.clone(),
            limit: limits.max_file_size_bytes,
        });
    }
    Ok(())
}

/// Validate a parsed chat request before anything is sent upstream
///
/// A request needs a non-blank message or at least one attachment, and every
/// attachment must pass [`validate_attachment`].
pub fn validate_chat_request(request: &ChatRequest, limits: &UploadConfig) -> Result<(), AppError> {
    if request.attachments.len() > limits.max_files {
        return Err(AppError::TooManyFiles(limits.max_files));
    }
    for attachment in &request.attachments {
        validate_attachment(attachment, limits)?;
    }
    if request.message.trim().is_empty() && request.attachments.is_empty() {
        return Err(AppError::MessageRequired);
    }
    Ok(())
}
