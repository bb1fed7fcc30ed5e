// src/error.rs

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use uuid::Uuid;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 400 Bad Request: malformed or incomplete client input
    Validation(String),

    // 401 Unauthorized: the detail is logged, never returned
    Authentication(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (duplicate email, duplicate submission)
    Conflict(String),

    // 500: the exam directory is unreachable or answered with garbage
    Upstream(String),

    // 500: a store read or write failed
    Persistence(String),

    // 500
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "validation error: {msg}"),
            AppError::Authentication(msg) => write!(f, "authentication error: {msg}"),
            AppError::Forbidden(msg) => write!(f, "forbidden: {msg}"),
            AppError::NotFound(msg) => write!(f, "not found: {msg}"),
            AppError::Conflict(msg) => write!(f, "conflict: {msg}"),
            AppError::Upstream(msg) => write!(f, "upstream error: {msg}"),
            AppError::Persistence(msg) => write!(f, "persistence error: {msg}"),
            AppError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

/// Builds the body of a 5xx response and logs the hidden detail under
/// a fresh error id, so operators can correlate a client report with the log.
fn opaque_failure(kind: &str, detail: &str, public_message: &str) -> (StatusCode, serde_json::Value) {
    let error_id = Uuid::new_v4();
    tracing::error!(%error_id, kind, detail = %detail, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({
            "message": public_message,
            "error_id": error_id,
        }),
    )
}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "message": msg })),
            AppError::Authentication(detail) => {
                tracing::debug!(detail = %detail, "rejected credentials");
                let mut response = (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "message": "Unauthorized" })),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                return response;
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "message": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "message": msg })),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "message": msg })),
            AppError::Upstream(detail) => {
                opaque_failure("upstream", &detail, "Exam service unavailable")
            }
            AppError::Persistence(detail) => {
                opaque_failure("persistence", &detail, "Internal Server Error")
            }
            AppError::Internal(detail) => opaque_failure("internal", &detail, "Internal Server Error"),
        };

        (status, Json(body)).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError`.
/// Unique violations become `Conflict`, everything else `Persistence`.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AppError::Conflict(db_err.message().to_string());
            }
        }
        AppError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Upstream(format!("exam directory timed out: {err}"))
        } else {
            AppError::Upstream(err.to_string())
        }
    }
}
