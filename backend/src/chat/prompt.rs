//! Conversation assembly
//!
//! Builds the ordered list of turns sent upstream: priming turns, then the
//! caller's history, then the in-flight message with its attachments.

use crate::chat::models::{Attachment, ChatRequest, HistoryEntry};
use crate::config::ChatConfig;
use crate::gemini::{Content, InlineData, Part, Role};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Turns establishing the default response language
///
/// Empty when priming is disabled.
pub fn priming_turns(config: &ChatConfig) -> Vec<Content> {
    if !config.priming_enabled {
        return Vec::new();
    }
    let language = config.response_language.trim();
    if language.is_empty() {
        return Vec::new();
    }

    vec![
        Content::text(
            Role::User,
            format!(
                "From now on, answer in {} unless I explicitly ask for another language.",
                language
            ),
        ),
        Content::text(
            Role::Model,
            format!("Understood. I will answer in {}.", language),
        ),
    ]
}

/// Map caller-supplied history to upstream turns
///
/// Entries without text are dropped; the provider rejects empty parts.
pub fn history_turns(history: &[HistoryEntry]) -> Vec<Content> {
    history
        .iter()
        .filter(|entry| !entry.text.trim().is_empty())
        .map(|entry| Content::text(entry.role(), entry.text.clone()))
        .collect()
}

/// The in-flight user turn: text first, then every attachment inline
pub fn current_turn(message: &str, attachments: &[Attachment]) -> Content {
    let mut parts = Vec::with_capacity(attachments.len() + 1);
    if !message.trim().is_empty() {
        parts.push(Part::Text {
            text: message.to_string(),
        });
    }
    parts.extend(attachments.iter().map(inline_part));

    Content {
        role: Role::User,
        parts,
    }
}

fn inline_part(attachment: &Attachment) -> Part {
    Part::InlineData {
        inline_data: InlineData {
            mime_type: attachment.mime_type.clone(),
            data: STANDARD.encode(&attachment.data),
        },
    }
}

/// Assemble the full conversation for a validated request
pub fn build_contents(config: &ChatConfig, request: &ChatRequest) -> Vec<Content> {
    let mut contents = priming_turns(config);
    contents.extend(history_turns(&request.history));
    contents.push(current_turn(&request.message, &request.attachments));
    contents
}
