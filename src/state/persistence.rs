// Conversation persistence
// Saves and loads conversations and the theme preference

use super::models::{Conversation, ConversationId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Current version of the data file format
const DATA_VERSION: u32 = 1;

/// Error types for persistence operations
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// File I/O error
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization/deserialization error
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
    /// Invalid data format
    #[error("Invalid Data: {0}")]
    InvalidData(String),
}

/// Everything the client keeps between runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatData {
    /// Conversations by id
    pub conversations: HashMap<ConversationId, Conversation>,
    /// Stored theme preference; `None` follows the platform
    #[serde(default)]
    pub dark_mode: Option<bool>,
}

/// Storage backend for [`ChatData`]
pub trait ChatPersistence {
    /// Load stored data, or empty data when nothing was stored yet
    fn load(&self) -> Result<ChatData, PersistenceError>;

    /// Replace the stored data
    fn save(&self, data: &ChatData) -> Result<(), PersistenceError>;
}

/// On-disk layout, versioned for future migrations
#[derive(Serialize, Deserialize)]
struct ChatFileData {
    version: u32,
    #[serde(flatten)]
    data: ChatData,
}

/// Stores chat data as pretty-printed JSON in a single file
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the default path for the data file
    /// Returns a path in the user's home directory or current directory
    pub fn default_path() -> PathBuf {
        if let Some(home) = std::env::var_os("HOME") {
            let mut path = PathBuf::from(home);
            path.push(".gemini-chat");
            path.push("chats.json");
            path
        } else {
            PathBuf::from("chats.json")
        }
    }
}

impl ChatPersistence for JsonFilePersistence {
    fn load(&self) -> Result<ChatData, PersistenceError> {
        if !self.path.exists() {
            return Ok(ChatData::default());
        }

        let json = fs::read_to_string(&self.path)?;
        let file: ChatFileData = serde_json::from_str(&json)?;

        if file.version != DATA_VERSION {
            return Err(PersistenceError::InvalidData(format!(
                "Unsupported data file version: {}",
                file.version
            )));
        }

        Ok(file.data)
    }

    fn save(&self, data: &ChatData) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = ChatFileData {
            version: DATA_VERSION,
            data: data.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        // Write then rename so a crash mid-write keeps the previous file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        Ok(())
    }
}

/// Keeps chat data in memory
///
/// Clones share the same data, so a test can keep a handle and inspect
/// what a store saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    data: Arc<Mutex<ChatData>>,
    #[cfg(test)]
    fail_saves: Arc<std::sync::atomic::AtomicBool>,
}

#[cfg(test)]
impl MemoryPersistence {
    pub fn with_data(data: ChatData) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
            ..Self::default()
        }
    }

    /// Make every following save fail like a full disk
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Copy of the last saved data
    pub fn snapshot(&self) -> ChatData {
        self.data.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl ChatPersistence for MemoryPersistence {
    fn load(&self) -> Result<ChatData, PersistenceError> {
        self.data
            .lock()
            .map(|d| d.clone())
            .map_err(|_| PersistenceError::InvalidData("memory store poisoned".to_string()))
    }

    fn save(&self, data: &ChatData) -> Result<(), PersistenceError> {
        #[cfg(test)]
        if self.fail_saves.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(PersistenceError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "no space left on device",
            )));
        }
        let mut stored = self
            .data
            .lock()
            .map_err(|_| PersistenceError::InvalidData("memory store poisoned".to_string()))?;
        *stored = data.clone();
        Ok(())
    }
}
