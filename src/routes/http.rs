// GET handlers: version, health

use axum::response::IntoResponse;

use crate::version::{NAME, VERSION};

/// GET /version: service name and version.
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/health
pub(super) async fn health_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
