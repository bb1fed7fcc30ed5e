// src/handlers/mod.rs

pub mod auth;
pub mod exam;
pub mod question;
pub mod submission;
pub mod system;

use uuid::Uuid;

use crate::error::AppError;

/// Parses an identifier taken from the URL path.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::Validation(format!("Invalid {what} ID format")))
}
