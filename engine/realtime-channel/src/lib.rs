//! RealtimeChannel - push-channel client with reconnection
//!
//! Maintains the long-lived push connection to the exchange feed, decodes
//! inbound messages, and emits change notifications to the screening
//! pipeline. Disconnects enter a reconnect loop with capped exponential
//! backoff; only an explicit `close()` stops the channel.

pub mod backoff;
pub mod channel;
pub mod error;
pub mod messages;

pub use backoff::Backoff;
pub use channel::{ChannelConfig, ChannelEvent, ChannelState, RealtimeChannel};
pub use error::ChannelError;
pub use messages::{PushMessage, PushMessageType};

// Result type alias
pub type Result<T> = std::result::Result<T, ChannelError>;
