// Conversation data model
// Conversations, their messages and the metadata of files sent with them

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a conversation
pub type ConversationId = String;

/// Title shown while a generated title is pending
pub const PENDING_TITLE: &str = "New conversation...";

/// Title used when title generation fails or returns nothing
pub const FALLBACK_TITLE: &str = "New conversation";

/// Titles longer than this are shortened in the sidebar
const SIDEBAR_TITLE_MAX: usize = 25;
/// Characters kept when a sidebar title is shortened
const SIDEBAR_TITLE_KEEP: usize = 22;

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    /// Value of the `sender` field in proxy history entries
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

/// A file that was sent with a message
///
/// Only the metadata is kept; the bytes are not stored with the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMeta {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentMeta>,
    /// Stored as epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current time
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            attachments: Vec::new(),
            timestamp: now_millis(),
        }
    }

    /// Attach file metadata to the message
    pub fn with_attachments(mut self, attachments: Vec<AttachmentMeta>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// A titled, ordered list of messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    pub messages: Vec<Message>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Create an empty conversation with a fresh id
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: format!("chat-{}", uuid::Uuid::new_v4()),
            title: title.into(),
            messages: Vec::new(),
            created_at: now_millis(),
        }
    }

    /// Title as shown in the sidebar
    pub fn short_title(&self) -> String {
        shorten_title(&self.title)
    }
}

/// Current time at the millisecond precision it is stored with
fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Shorten a title longer than 25 characters to 22 characters plus `...`
pub fn shorten_title(title: &str) -> String {
    if title.chars().count() > SIDEBAR_TITLE_MAX {
        let kept: String = title.chars().take(SIDEBAR_TITLE_KEEP).collect();
        format!("{}...", kept)
    } else {
        title.to_string()
    }
}
