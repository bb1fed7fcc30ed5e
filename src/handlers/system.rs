// src/handlers/system.rs

use axum::{
    Json,
    http::{Method, StatusCode, Uri},
    response::IntoResponse,
};
use serde_json::json;

pub async fn root() -> &'static str {
    "Exam portal is running"
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "exam-portal" }))
}

/// Fallback for unknown routes.
pub async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "message": "404 | Route not found",
            "path": uri.path(),
            "method": method.as_str(),
        })),
    )
}
