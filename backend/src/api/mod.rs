//! API module
//!
//! Contains HTTP request handlers and the router that wires them together.

pub mod chat;
pub mod health;
pub mod streaming;
pub mod utils;

use crate::state::AppState;
use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use std::time::Instant;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Request ID middleware - adds unique ID to each request for tracing
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

/// Build the application router
///
/// Serves the configured static directory (if any) for every path the API
/// does not claim.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_request_body_bytes();
    let static_dir = state.config.server.static_dir.clone();

    let mut app = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/chat", post(chat::chat));

    match static_dir {
        Some(dir) => {
            info!("Serving static files from {}", dir.display());
            app = app.fallback_service(ServeDir::new(dir));
        }
        None => {
            app = app.route("/", get(health::hello_world));
        }
    }

    app
        // Middleware (order matters - request_id should be first)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
