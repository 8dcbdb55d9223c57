//! Error types for the screener store

use thiserror::Error;

/// Errors that can occur in the screener store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Screener not found: {id}")]
    ScreenerNotFound { id: String },

    #[error("Folder not found: {id}")]
    FolderNotFound { id: String },

    #[error("Persistence mutation failed: {message}")]
    MutationFailed { message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether this error reports a rejected/failed mutation round-trip
    pub fn is_mutation_failure(&self) -> bool {
        matches!(self, StoreError::MutationFailed { .. } | StoreError::Http(_))
    }
}
