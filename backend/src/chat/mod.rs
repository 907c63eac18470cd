//! Chat module
//!
//! Request models and conversation assembly for the proxy endpoint.

pub mod models;
pub mod prompt;

pub use models::{Attachment, ChatReply, ChatRequest, HistoryEntry};
