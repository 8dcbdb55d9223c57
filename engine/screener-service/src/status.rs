//! Feed status view

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time feed status exposed to presentation collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatus {
    /// Whether the push channel is currently open
    pub api_connected: bool,

    /// Timestamp of the last successful cache ingestion
    pub last_update: Option<DateTime<Utc>>,

    /// Whether cached data has outlived the staleness grace period
    pub stale: bool,

    /// Last upstream error surfaced by the push channel, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
