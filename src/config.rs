// Client configuration
// Reads the proxy URL, data file location and streaming preference from the environment

use crate::state::JsonFilePersistence;
use std::env;
use std::path::PathBuf;

/// Proxy server used when `CHAT_SERVER_URL` is not set
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

/// Client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the chat proxy (without `/api/chat`)
    pub server_url: String,
    /// File conversations and the theme preference are stored in
    pub data_file: PathBuf,
    /// Whether replies are requested as a paced text stream
    pub stream: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            data_file: JsonFilePersistence::default_path(),
            stream: true,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_url: env::var("CHAT_SERVER_URL")
                .ok()
                .filter(|u| !u.trim().is_empty())
                .unwrap_or(defaults.server_url),
            data_file: env::var_os("CHAT_DATA_FILE")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file),
            stream: env::var("CHAT_STREAM")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.stream),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for var in ["CHAT_SERVER_URL", "CHAT_DATA_FILE", "CHAT_STREAM"] {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = ClientConfig::from_env();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert!(config.stream);
        assert!(config.data_file.ends_with("chats.json"));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        env::set_var("CHAT_SERVER_URL", "http://localhost:8080");
        env::set_var("CHAT_DATA_FILE", "/tmp/chats-test.json");
        env::set_var("CHAT_STREAM", "false");

        let config = ClientConfig::from_env();
        clear_env();

        assert_eq!(config.server_url, "http://localhost:8080");
        assert_eq!(config.data_file, PathBuf::from("/tmp/chats-test.json"));
        assert!(!config.stream);
    }

    #[test]
    #[serial]
    fn test_invalid_stream_flag_keeps_default() {
        clear_env();
        env::set_var("CHAT_STREAM", "sometimes");
        let config = ClientConfig::from_env();
        clear_env();
        assert!(config.stream);
    }
}
