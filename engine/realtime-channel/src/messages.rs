//! Push channel message types

use crate::channel::ChannelEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticker_cache::WireTicker;
use tracing::debug;

/// Message kinds the push channel delivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PushMessageType {
    FuturesUpdate,
    AccountUpdate,
    PositionUpdate,
    Error,
}

/// Envelope for all push channel messages:
/// `{ "type": ..., "data": <payload>, "timestamp"?: "..." }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushMessage {
    #[serde(rename = "type")]
    pub message_type: PushMessageType,

    #[serde(default)]
    pub data: Option<serde_json::Value>,

    #[serde(default)]
    pub timestamp: Option<String>,
}

impl PushMessage {
    /// Batch timestamp: the message's own stamp when it parses, otherwise
    /// the arrival time.
    pub fn effective_timestamp(&self) -> DateTime<Utc> {
        self.timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or_else(Utc::now)
    }

    /// Map a decoded message onto the event the pipeline consumes.
    ///
    /// Only `futuresUpdate` drives the cache: with an array payload it
    /// becomes a direct ingest, without one it requests a refresh fetch.
    /// `error` surfaces without altering cache state; account/position
    /// updates are outside the screening scope and produce no event.
    pub fn into_event(self) -> Option<ChannelEvent> {
        match self.message_type {
            PushMessageType::FuturesUpdate => {
                let timestamp = self.effective_timestamp();
                match self.data {
                    Some(serde_json::Value::Array(items)) => {
                        let tickers: Vec<WireTicker> = items
                            .into_iter()
                            .filter_map(|item| serde_json::from_value(item).ok())
                            .collect();
                        Some(ChannelEvent::Ingest { tickers, timestamp })
                    }
                    _ => Some(ChannelEvent::RefreshRequested),
                }
            }
            PushMessageType::Error => {
                let message = self
                    .data
                    .as_ref()
                    .and_then(|d| d.as_str().map(str::to_string))
                    .unwrap_or_else(|| self.data.map(|d| d.to_string()).unwrap_or_default());
                Some(ChannelEvent::UpstreamError { message })
            }
            PushMessageType::AccountUpdate | PushMessageType::PositionUpdate => {
                debug!("Ignoring {:?} push message", self.message_type);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_futures_update_with_payload_ingests_directly() {
        let message: PushMessage = serde_json::from_str(
            r#"{
                "type": "futuresUpdate",
                "data": [{"symbol": "BTCUSDT", "lastPrice": "50000"}],
                "timestamp": "2026-08-27T12:00:00Z"
            }"#,
        )
        .unwrap();

        match message.into_event() {
            Some(ChannelEvent::Ingest { tickers, timestamp }) => {
                assert_eq!(tickers.len(), 1);
                assert_eq!(tickers[0].symbol.as_deref(), Some("BTCUSDT"));
                assert_eq!(timestamp.to_rfc3339(), "2026-08-27T12:00:00+00:00");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_futures_update_without_payload_requests_refresh() {
        let message: PushMessage =
            serde_json::from_str(r#"{"type": "futuresUpdate"}"#).unwrap();
        assert!(matches!(message.into_event(), Some(ChannelEvent::RefreshRequested)));

        let message: PushMessage =
            serde_json::from_str(r#"{"type": "futuresUpdate", "data": null}"#).unwrap();
        assert!(matches!(message.into_event(), Some(ChannelEvent::RefreshRequested)));
    }

    #[test]
    fn test_error_message_surfaces_without_ingesting() {
        let message: PushMessage =
            serde_json::from_str(r#"{"type": "error", "data": "rate limited"}"#).unwrap();
        match message.into_event() {
            Some(ChannelEvent::UpstreamError { message }) => {
                assert_eq!(message, "rate limited");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_account_and_position_updates_produce_no_event() {
        let message: PushMessage =
            serde_json::from_str(r#"{"type": "accountUpdate", "data": {}}"#).unwrap();
        assert!(message.into_event().is_none());

        let message: PushMessage =
            serde_json::from_str(r#"{"type": "positionUpdate", "data": {}}"#).unwrap();
        assert!(message.into_event().is_none());
    }

    #[test]
    fn test_unparsable_timestamp_falls_back_to_arrival_time() {
        let message: PushMessage = serde_json::from_str(
            r#"{"type": "futuresUpdate", "data": [], "timestamp": "yesterday"}"#,
        )
        .unwrap();
        let before = Utc::now();
        let ts = message.effective_timestamp();
        assert!(ts >= before);
    }
}
