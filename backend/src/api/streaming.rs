//! Pseudo-streaming utilities
//!
//! The upstream reply is already complete when streaming starts. It is
//! written to the client one character per chunk with a fixed delay, which
//! only affects pacing: the concatenated chunks always equal the reply.

use crate::error::AppError;
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use futures_util::{stream::Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;

/// Split `reply` into single-character chunks paced by `delay`
///
/// The first chunk is emitted immediately; the delay sits between chunks.
pub fn char_stream(reply: String, delay: Duration) -> impl Stream<Item = String> {
    use async_stream::stream;

    stream! {
        let mut first = true;
        for ch in reply.chars() {
            if !first && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            first = false;
            yield ch.to_string();
        }
    }
}

/// Build the `text/plain` streaming response for a complete reply
///
/// # Arguments
/// * `reply` - Full reply text
/// * `delay` - Pause between characters
///
/// # Returns
/// * `Result<Response, AppError>` - Chunked HTTP response or error
pub fn create_text_stream(reply: String, delay: Duration) -> Result<Response, AppError> {
    let reply_len = reply.chars().count();
    tracing::debug!(chars = reply_len, delay_ms = delay.as_millis() as u64, "Streaming reply");

    // Headers are gone once the body starts; a dropped connection simply ends the stream.
    let body_stream = char_stream(reply, delay).map(Ok::<_, Infallible>);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .header("x-content-type-options", "nosniff")
        .body(Body::from_stream(body_stream))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build streaming response: {}", e)))
}
