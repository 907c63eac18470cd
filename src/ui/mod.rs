// UI module
// Contains layout, components, and the actions the UI reports back

pub mod components;
pub mod layout;

pub use layout::render_app_layout;

use crate::state::ConversationId;

/// Something the user asked for during a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    NewChat,
    Select(ConversationId),
    Rename {
        conversation_id: ConversationId,
        title: String,
    },
    Delete(ConversationId),
    Send,
    Stop,
    SetDarkMode(bool),
}
