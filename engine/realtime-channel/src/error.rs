//! Error types for the realtime channel

use thiserror::Error;

/// Errors that can occur in the realtime channel.
///
/// Connection and decode failures never surface here; the channel task
/// retries the former and skips the latter.
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Invalid channel URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
