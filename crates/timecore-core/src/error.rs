//! Error types for timecore-core

use thiserror::Error;

/// Result type alias using timecore-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in timecore-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level HTTP failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("API error: {message} ({status})")]
    Api { status: u16, message: String },

    /// Time report not found
    #[error("Time report not found: {0}")]
    NotFound(i64),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}
