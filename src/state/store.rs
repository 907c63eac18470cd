// Conversation store
// Owns all conversations, the active selection and the theme preference.
// Every change is written through the injected persistence.

use super::models::{Conversation, ConversationId, Message};
use super::persistence::{ChatData, ChatPersistence, PersistenceError};
use tracing::debug;

/// Conversations plus the storage they are saved to
pub struct ConversationStore {
    persistence: Box<dyn ChatPersistence>,
    data: ChatData,
    /// Conversation shown in the chat view (not persisted)
    active_id: Option<ConversationId>,
}

impl ConversationStore {
    /// Load stored conversations
    pub fn load(persistence: Box<dyn ChatPersistence>) -> Result<Self, PersistenceError> {
        let data = persistence.load()?;
        debug!(conversations = data.conversations.len(), "Loaded conversations");
        Ok(Self {
            persistence,
            data,
            active_id: None,
        })
    }

    /// Write the current state to persistence
    pub fn save(&self) -> Result<(), PersistenceError> {
        self.persistence.save(&self.data)
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.data.conversations.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.data.conversations.is_empty()
    }

    /// All conversations, newest first
    pub fn list(&self) -> Vec<&Conversation> {
        let mut conversations: Vec<&Conversation> = self.data.conversations.values().collect();
        conversations.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        conversations
    }

    /// Create a conversation, make it active and persist
    /// Nothing changes if the save fails
    pub fn create(&mut self, title: impl Into<String>) -> Result<ConversationId, PersistenceError> {
        let conversation = Conversation::new(title);
        let id = conversation.id.clone();
        self.data.conversations.insert(id.clone(), conversation);
        let previous_active = self.active_id.replace(id.clone());
        if let Err(e) = self.save() {
            self.data.conversations.remove(&id);
            self.active_id = previous_active;
            return Err(e);
        }
        Ok(id)
    }

    /// Append a message to a conversation and persist
    /// Returns false if the conversation no longer exists; nothing changes
    /// if the save fails
    pub fn append(&mut self, id: &str, message: Message) -> Result<bool, PersistenceError> {
        match self.data.conversations.get_mut(id) {
            Some(conversation) => conversation.messages.push(message),
            None => return Ok(false),
        }
        if let Err(e) = self.save() {
            if let Some(conversation) = self.data.conversations.get_mut(id) {
                conversation.messages.pop();
            }
            return Err(e);
        }
        Ok(true)
    }

    /// Rename a conversation
    /// Blank titles are ignored; returns true if the title changed
    pub fn rename(&mut self, id: &str, title: &str) -> Result<bool, PersistenceError> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(false);
        }
        match self.data.conversations.get_mut(id) {
            Some(conversation) if conversation.title != title => {
                conversation.title = title.to_string();
                self.save()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Delete a conversation
    /// If the deleted conversation was active, the selection is cleared
    pub fn delete(&mut self, id: &str) -> Result<Option<Conversation>, PersistenceError> {
        let removed = self.data.conversations.remove(id);
        if removed.is_some() {
            if self.active_id.as_deref() == Some(id) {
                self.active_id = None;
            }
            self.save()?;
        }
        Ok(removed)
    }

    /// Select a conversation by ID
    /// Returns true if the conversation was found and selected
    pub fn select(&mut self, id: &str) -> bool {
        if self.data.conversations.contains_key(id) {
            self.active_id = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Start a new chat: nothing is active until the next send creates one
    pub fn clear_selection(&mut self) {
        self.active_id = None;
    }

    pub fn active_id(&self) -> Option<&ConversationId> {
        self.active_id.as_ref()
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.active_id
            .as_ref()
            .and_then(|id| self.data.conversations.get(id))
    }

    pub fn dark_mode(&self) -> Option<bool> {
        self.data.dark_mode
    }

    /// Store the theme preference and persist
    pub fn set_dark_mode(&mut self, dark_mode: bool) -> Result<(), PersistenceError> {
        if self.data.dark_mode != Some(dark_mode) {
            self.data.dark_mode = Some(dark_mode);
            self.save()?;
        }
        Ok(())
    }
}
