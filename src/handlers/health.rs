use axum::{response::IntoResponse, Json};
use serde_json::json;

/// Liveness probe for the presentation layer and deploy tooling.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "netzero-bridge",
    }))
}
