use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] timecore_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Nothing to update. Pass at least one field or an items edit.")]
    EmptyPatch,
    #[error("Failed to read items from {path}: {message}")]
    ItemsFile { path: String, message: String },
    #[error(
        "No API base URL configured. Run `timecore config init --api-base-url <URL>` or set TIMECORE_API_BASE_URL."
    )]
    NotConfigured,
}
