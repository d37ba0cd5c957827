//! Error types for the user API suite

use thiserror::Error;

/// Result type alias using ApiError
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Assertion failed on {case}: {reason}")]
    AssertionFailed { case: String, reason: String },

    #[error("Unexpected status {status} for {case}")]
    UnexpectedStatus { case: String, status: u16 },
}

impl ApiError {
    pub(crate) fn assertion(case: &str, reason: impl Into<String>) -> Self {
        ApiError::AssertionFailed {
            case: case.to_string(),
            reason: reason.into(),
        }
    }
}
