//! State management module
//!
//! Shared, read-only state handed to every request handler.

pub mod app_state;

pub use app_state::AppState;
