// Application UI state
// Input box, pending attachments, the in-flight request and dialogs

use super::models::ConversationId;
use crate::client::PendingAttachment;
use futures_util::future::AbortHandle;

/// A request that has been sent and not yet finished
#[derive(Debug)]
pub struct InFlight {
    /// Matches events from the background task to this request
    pub request_id: u64,
    pub conversation_id: ConversationId,
    pub abort: AbortHandle,
    /// Reply text received so far
    pub partial: String,
}

/// Rename dialog contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameDialog {
    pub conversation_id: ConversationId,
    pub draft: String,
}

/// Main application UI state
#[derive(Debug, Default)]
pub struct AppState {
    /// Text in the message box
    pub input: String,
    /// Files that will be sent with the next message
    pub attachments: Vec<PendingAttachment>,
    pub in_flight: Option<InFlight>,
    /// Error or warning shown under the messages until the next action
    pub notice: Option<String>,
    pub rename: Option<RenameDialog>,
    /// Conversation waiting for delete confirmation
    pub confirm_delete: Option<ConversationId>,
    next_request_id: u64,
}

impl AppState {
    /// Create a new application state with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Id for the next background request
    pub fn next_request_id(&mut self) -> u64 {
        self.next_request_id += 1;
        self.next_request_id
    }

    /// Add streamed text if it belongs to the current request
    /// Returns false for text from a request that was cancelled or replaced
    pub fn push_chunk(&mut self, request_id: u64, text: &str) -> bool {
        match self.in_flight.as_mut() {
            Some(in_flight) if in_flight.request_id == request_id => {
                in_flight.partial.push_str(text);
                true
            }
            _ => false,
        }
    }

    /// Take the in-flight request if `request_id` is the current one
    pub fn finish_request(&mut self, request_id: u64) -> Option<InFlight> {
        if self.in_flight.as_ref().map(|f| f.request_id) == Some(request_id) {
            self.in_flight.take()
        } else {
            None
        }
    }

    /// Abort the in-flight request; its partial reply is dropped
    /// Returns true if there was a request to cancel
    pub fn cancel_request(&mut self) -> bool {
        match self.in_flight.take() {
            Some(in_flight) => {
                in_flight.abort.abort();
                true
            }
            None => false,
        }
    }

    /// Take the input text and attachments for sending
    pub fn take_draft(&mut self) -> (String, Vec<PendingAttachment>) {
        (
            std::mem::take(&mut self.input),
            std::mem::take(&mut self.attachments),
        )
    }

    pub fn remove_attachment(&mut self, index: usize) -> Option<PendingAttachment> {
        if index < self.attachments.len() {
            Some(self.attachments.remove(index))
        } else {
            None
        }
    }
}
