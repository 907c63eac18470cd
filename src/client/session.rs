// Send lifecycle
// begin_send records the user message, dispatch runs the request (cancellable),
// finish_send stores the bot reply only when one arrived

use super::api::{ChatRequest, HistoryEntry, ProxyClient};
use super::attachments::PendingAttachment;
use super::ClientError;
use crate::state::{
    ConversationId, ConversationStore, Message, PersistenceError, Sender, FALLBACK_TITLE,
    PENDING_TITLE,
};
use futures_util::future::{AbortRegistration, Abortable};
use thiserror::Error;
use tracing::{info, warn};

/// A send that has been recorded and is ready to go out
#[derive(Debug, Clone)]
pub struct SendTicket {
    pub conversation_id: ConversationId,
    pub request: ChatRequest,
    /// Set when the send created the conversation; the text to title it from
    pub title_source: Option<String>,
}

/// A send that could not be recorded
///
/// Hands the attachments back so the draft can be restored.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct BeginSendError {
    pub error: ClientError,
    pub attachments: Vec<PendingAttachment>,
}

/// How a dispatched request ended
#[derive(Debug)]
pub enum SendOutcome {
    Replied(String),
    Cancelled,
    Failed(ClientError),
}

/// Record a user message and build the request for it
///
/// Creates a conversation when none is active. The history sent is the
/// conversation as it was before this message. Returns `None` when there is
/// nothing to send. If the message cannot be saved the store is left as it
/// was and the attachments come back in the error.
pub fn begin_send(
    store: &mut ConversationStore,
    text: &str,
    attachments: Vec<PendingAttachment>,
    stream: bool,
) -> Result<Option<SendTicket>, BeginSendError> {
    let text = text.trim();
    if text.is_empty() && attachments.is_empty() {
        return Ok(None);
    }

    let active = store.active_id().cloned();
    let (conversation_id, title_source) = match active {
        Some(id) => (id, None),
        None => {
            let id = match store.create(PENDING_TITLE) {
                Ok(id) => id,
                Err(e) => {
                    return Err(BeginSendError {
                        error: e.into(),
                        attachments,
                    })
                }
            };
            let source = if text.is_empty() {
                attachments
                    .iter()
                    .map(|a| a.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            } else {
                text.to_string()
            };
            (id, Some(source))
        }
    };

    let history = store
        .get(&conversation_id)
        .map(|conversation| {
            conversation
                .messages
                .iter()
                .map(|m| HistoryEntry {
                    sender: m.sender.as_str().to_string(),
                    text: m.text.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    let metas = attachments.iter().map(|a| a.meta()).collect();
    if let Err(e) = store.append(
        &conversation_id,
        Message::new(Sender::User, text).with_attachments(metas),
    ) {
        if title_source.is_some() {
            // Drop the conversation this send created
            if let Err(cleanup) = store.delete(&conversation_id) {
                warn!(conversation_id = %conversation_id, "Could not remove the empty conversation: {}", cleanup);
            }
        }
        return Err(BeginSendError {
            error: e.into(),
            attachments,
        });
    }

    Ok(Some(SendTicket {
        conversation_id,
        request: ChatRequest {
            message: text.to_string(),
            history,
            attachments,
            stream,
        },
        title_source,
    }))
}

/// Run a chat request until it finishes or is aborted
pub async fn dispatch<F>(
    client: &ProxyClient,
    request: &ChatRequest,
    registration: AbortRegistration,
    on_chunk: F,
) -> SendOutcome
where
    F: FnMut(&str) + Send,
{
    match Abortable::new(client.chat(request, on_chunk), registration).await {
        Ok(Ok(reply)) => SendOutcome::Replied(reply),
        Ok(Err(e)) => SendOutcome::Failed(e),
        Err(_aborted) => SendOutcome::Cancelled,
    }
}

/// Store the outcome of a send
///
/// Only a reply is stored; cancelled and failed sends leave the
/// conversation as `begin_send` left it. Returns true if a bot message was
/// appended.
pub fn finish_send(
    store: &mut ConversationStore,
    conversation_id: &str,
    outcome: &SendOutcome,
) -> Result<bool, PersistenceError> {
    match outcome {
        SendOutcome::Replied(reply) => {
            let appended = store.append(conversation_id, Message::new(Sender::Bot, reply.clone()))?;
            if !appended {
                info!(conversation_id, "Reply arrived for a deleted conversation");
            }
            Ok(appended)
        }
        SendOutcome::Cancelled => {
            info!(conversation_id, "Request cancelled");
            Ok(false)
        }
        SendOutcome::Failed(e) => {
            warn!(conversation_id, "Request failed: {}", e);
            Ok(false)
        }
    }
}

/// Replace the pending title with a generated one, or the fallback
///
/// A title the user set in the meantime is kept.
pub fn apply_title(
    store: &mut ConversationStore,
    conversation_id: &str,
    generated: Result<Option<String>, ClientError>,
) -> Result<(), PersistenceError> {
    let still_pending = store
        .get(conversation_id)
        .map(|c| c.title == PENDING_TITLE)
        .unwrap_or(false);
    if !still_pending {
        return Ok(());
    }

    let title = match generated {
        Ok(Some(title)) => title,
        Ok(None) => FALLBACK_TITLE.to_string(),
        Err(e) => {
            warn!(conversation_id, "Title generation failed: {}", e);
            FALLBACK_TITLE.to_string()
        }
    };
    store.rename(conversation_id, &title)?;
    Ok(())
}
