use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

/// Liveness probe. Does not touch the cluster or the store.
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
