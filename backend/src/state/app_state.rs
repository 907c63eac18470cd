//! Application state
//!
//! The server keeps no session data: every request carries its own history.
//! The state only holds configuration and the upstream text generator.

use crate::config::Config;
use crate::gemini::{GeminiClient, GeminiError, TextGenerator};
use std::sync::Arc;

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<Config>,
    /// Upstream reply generator
    pub generator: Arc<dyn TextGenerator>,
}

impl AppState {
    /// Create state around an arbitrary generator
    pub fn new(config: Config, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            config: Arc::new(config),
            generator,
        }
    }

    /// Create state backed by the real Gemini client
    pub fn with_gemini(config: Config) -> Result<Self, GeminiError> {
        let client = GeminiClient::new(&config.gemini)?;
        Ok(Self::new(config, Arc::new(client)))
    }
}
