//! Configuration for the screener service

use serde::{Deserialize, Serialize};

/// Configuration for the screener service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerConfig {
    /// REST feed configuration
    pub feed: FeedConfig,

    /// Push channel configuration
    pub channel: ChannelSettings,

    /// Owner id used for screener/folder persistence
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Base URL of the REST collaborator (no trailing slash)
    pub base_url: String,

    /// Primary ticker poll interval in seconds
    pub poll_interval_secs: u64,

    /// Grace period in seconds before cached data counts as stale
    pub stale_grace_secs: u64,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// Push channel URL
    pub url: String,

    /// Reconnect backoff base in seconds
    pub backoff_base_secs: u64,

    /// Reconnect backoff growth factor
    pub backoff_factor: f64,

    /// Reconnect backoff cap in seconds
    pub backoff_cap_secs: u64,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig {
                base_url: "http://127.0.0.1:5000/api".to_string(),
                poll_interval_secs: 5,
                stale_grace_secs: 10,
                request_timeout_secs: 30,
            },
            channel: ChannelSettings {
                url: "ws://127.0.0.1:5000/ws".to_string(),
                backoff_base_secs: 1,
                backoff_factor: 2.0,
                backoff_cap_secs: 30,
            },
            user_id: "default-user".to_string(),
        }
    }
}

impl ScreenerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("SCREENER_API_BASE_URL") {
            config.feed.base_url = base_url;
        }
        if let Ok(url) = std::env::var("SCREENER_WS_URL") {
            config.channel.url = url;
        }
        if let Ok(secs) = std::env::var("SCREENER_POLL_SECS") {
            config.feed.poll_interval_secs =
                secs.parse().unwrap_or(config.feed.poll_interval_secs);
        }
        if let Ok(user_id) = std::env::var("SCREENER_USER_ID") {
            config.user_id = user_id;
        }

        config
    }

    /// Channel config in the realtime-channel crate's terms
    pub fn channel_config(&self) -> realtime_channel::ChannelConfig {
        realtime_channel::ChannelConfig {
            url: self.channel.url.clone(),
            backoff_base: std::time::Duration::from_secs(self.channel.backoff_base_secs),
            backoff_factor: self.channel.backoff_factor,
            backoff_cap: std::time::Duration::from_secs(self.channel.backoff_cap_secs),
        }
    }

    /// Staleness grace as a chrono duration
    pub fn stale_grace(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.feed.stale_grace_secs as i64)
    }
}
