// State management module
// Conversation data, its persistence, and UI state

pub mod app_state;
pub mod models;
pub mod persistence;
pub mod store;

pub use app_state::{AppState, InFlight, RenameDialog};
pub use models::{
    AttachmentMeta, Conversation, ConversationId, Message, Sender, FALLBACK_TITLE, PENDING_TITLE,
};
pub use persistence::{JsonFilePersistence, MemoryPersistence, PersistenceError};
pub use store::ConversationStore;
