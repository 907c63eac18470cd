// Client module
// Talks to the chat proxy and drives one send from start to finish

pub mod api;
pub mod attachments;
pub mod session;

pub use api::ProxyClient;
pub use attachments::PendingAttachment;
pub use session::{SendOutcome, SendTicket};

use crate::state::PersistenceError;
use thiserror::Error;

/// Errors from talking to the proxy
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection or protocol failure
    #[error("Could not reach the chat server: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status; `message` is the server's `reply` text
    #[error("{message} (HTTP {status})")]
    Server { status: u16, message: String },

    #[error("The server returned an empty reply")]
    EmptyReply,

    #[error("Could not encode the request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Could not save the conversation: {0}")]
    Persistence(#[from] PersistenceError),
}
