use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] focus_core::Error),
    #[error(transparent)]
    Remote(#[from] focus_core::sheets::SheetsError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Title cannot be empty")]
    EmptyTitle,
    #[error("Prompt text cannot be empty")]
    EmptyPromptText,
    #[error("ID cannot be empty")]
    EmptyId,
    #[error("No record found for id/prefix: {0}")]
    NotFound(String),
    #[error("{0}")]
    AmbiguousId(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "Sync is not configured. Run `focus config set --endpoint <URL> --secret <SECRET>` first."
    )]
    SyncNotConfigured,
    #[error("Sync failed: {0}")]
    SyncFailed(String),
}
