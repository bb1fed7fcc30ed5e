// src/config.rs

use std::{env, fmt, time::Duration};

use dotenvy::dotenv;
use url::Url;

/// Default token lifetime: 7 days.
pub const DEFAULT_JWT_EXPIRATION: u64 = 60 * 60 * 24 * 7;

/// Default bound on the exam directory call made while grading.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    /// Base URL of the privileged exam read, e.g. `http://exams:3000/api/admin/exams`.
    /// `None` makes the submission recorder read exams in-process.
    pub exam_service_url: Option<Url>,
    pub upstream_timeout: Duration,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub rust_log: String,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{key} must be set"),
            ConfigError::Invalid { key, reason } => write!(f, "{key} is invalid: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let jwt_secret = non_empty("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let exam_service_url = non_empty("EXAM_SERVICE_URL")
            .map(|raw| {
                Url::parse(&raw).map_err(|e| ConfigError::Invalid {
                    key: "EXAM_SERVICE_URL",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let cors_origins = non_empty("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            jwt_secret,
            jwt_expiration: parsed("JWT_EXPIRATION", DEFAULT_JWT_EXPIRATION)?,
            exam_service_url,
            upstream_timeout: Duration::from_secs(parsed(
                "UPSTREAM_TIMEOUT_SECS",
                DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )?),
            port: parsed("PORT", 3000)?,
            cors_origins,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            admin_email: non_empty("ADMIN_EMAIL"),
            admin_password: non_empty("ADMIN_PASSWORD"),
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parsed<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match non_empty(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
