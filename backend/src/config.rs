//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Default Gemini REST API base URL
pub const DEFAULT_GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Gemini model name
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// MIME types accepted for uploaded files
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "audio/mpeg",
    "audio/wav",
    "audio/x-wav",
    "audio/mp4",
    "audio/webm",
    "video/mp4",
    "video/webm",
    "video/ogg",
    "application/pdf",
    "text/plain",
];

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Upstream provider configuration
    pub gemini: GeminiConfig,
    /// Conversation assembly and reply delivery
    pub chat: ChatConfig,
    /// Upload limits
    pub uploads: UploadConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
    /// Directory served at `/` (the browser front end), if any
    pub static_dir: Option<PathBuf>,
}

/// Gemini provider configuration
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key sent with every upstream call
    pub api_key: String,
    /// Model name
    pub model: String,
    /// REST API base URL
    pub api_base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

// The API key stays out of logs.
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Chat behaviour configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Language the priming turns ask the model to answer in
    pub response_language: String,
    /// Whether priming turns are prepended at all
    pub priming_enabled: bool,
    /// Value of `stream` when the request does not say
    pub stream_by_default: bool,
    /// Delay between streamed characters (in milliseconds)
    pub stream_char_delay_ms: u64,
}

/// Upload limits configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Maximum size of a single uploaded file (in bytes)
    pub max_file_size_bytes: usize,
    /// Maximum number of files per request
    pub max_files: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 3000,
                host: "0.0.0.0".to_string(),
                static_dir: None,
            },
            gemini: GeminiConfig {
                api_key: String::new(),
                model: DEFAULT_GEMINI_MODEL.to_string(),
                api_base_url: DEFAULT_GEMINI_API_BASE_URL.to_string(),
                timeout_secs: 60,
            },
            chat: ChatConfig {
                response_language: "Bahasa Indonesia".to_string(),
                priming_enabled: true,
                stream_by_default: true,
                stream_char_delay_ms: 10,
            },
            uploads: UploadConfig {
                max_file_size_bytes: 20 * 1024 * 1024,
                max_files: 10,
            },
        }
    }
}

/// Parse an environment variable, falling back to `default` when unset or invalid
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server: ServerConfig {
                port: env_or("PORT", defaults.server.port),
                host: env::var("HOST").unwrap_or(defaults.server.host),
                static_dir: env::var("STATIC_DIR")
                    .ok()
                    .filter(|d| !d.trim().is_empty())
                    .map(PathBuf::from),
            },
            gemini: GeminiConfig {
                api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
                model: env::var("GEMINI_MODEL")
                    .ok()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or(defaults.gemini.model),
                api_base_url: env::var("GEMINI_API_BASE_URL")
                    .ok()
                    .filter(|u| !u.trim().is_empty())
                    .unwrap_or(defaults.gemini.api_base_url),
                timeout_secs: env_or("GEMINI_TIMEOUT_SECS", defaults.gemini.timeout_secs),
            },
            chat: ChatConfig {
                response_language: env::var("RESPONSE_LANGUAGE")
                    .ok()
                    .filter(|l| !l.trim().is_empty())
                    .unwrap_or(defaults.chat.response_language),
                priming_enabled: env_or("PRIMING_ENABLED", defaults.chat.priming_enabled),
                stream_by_default: env_or("STREAM_BY_DEFAULT", defaults.chat.stream_by_default),
                stream_char_delay_ms: env_or(
                    "STREAM_CHAR_DELAY_MS",
                    defaults.chat.stream_char_delay_ms,
                ),
            },
            uploads: UploadConfig {
                max_file_size_bytes: env_or(
                    "MAX_FILE_SIZE_BYTES",
                    defaults.uploads.max_file_size_bytes,
                ),
                max_files: env_or("MAX_FILES", defaults.uploads.max_files),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Largest request body the chat endpoint has to accept
    ///
    /// All files at their maximum size plus 1MB for the text fields.
    pub fn max_request_body_bytes(&self) -> usize {
        self.uploads
            .max_file_size_bytes
            .saturating_mul(self.uploads.max_files)
            .saturating_add(1024 * 1024)
    }
}
