//! Error types for the ticker cache

use thiserror::Error;

/// Errors that can occur in the ticker cache
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Malformed record: {reason}")]
    MalformedRecord { reason: String },
}
