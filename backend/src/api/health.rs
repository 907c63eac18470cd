//! Liveness endpoints

use axum::Json;
use serde::Serialize;

#[allow(missing_docs)]
#[derive(Serialize)]
pub struct HelloResponse {
    pub message: String,
    pub status: String,
}

#[allow(missing_docs)]
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub message: String,
}

/// GET / when no front end is served
pub async fn hello_world() -> Json<HelloResponse> {
    Json(HelloResponse {
        message: "Hello from Gemini Chat Backend!".to_string(),
        status: "ok".to_string(),
    })
}

/// GET /api/health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        message: "Backend is healthy".to_string(),
    })
}
