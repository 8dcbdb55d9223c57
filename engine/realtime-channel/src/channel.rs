//! Push channel client and state machine

use crate::backoff::Backoff;
use crate::messages::PushMessage;
use crate::Result;
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use ticker_cache::WireTicker;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

/// Connection lifecycle:
/// `Connecting → Open → Closed`, with `Open → Reconnecting → Open|Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Reconnecting,
    Closed,
}

/// Events the channel emits to its consumer
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// A futures update that carried its payload; ingest directly
    Ingest { tickers: Vec<WireTicker>, timestamp: DateTime<Utc> },

    /// A futures update that carried no payload; a full refresh fetch is
    /// required
    RefreshRequested,

    /// Upstream reported an error; cache state is not affected
    UpstreamError { message: String },
}

/// Realtime channel configuration
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Push channel URL (ws:// or wss://)
    pub url: String,

    /// Reconnect backoff base delay
    pub backoff_base: Duration,

    /// Reconnect backoff growth factor
    pub backoff_factor: f64,

    /// Reconnect backoff cap
    pub backoff_cap: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8080/ws".to_string(),
            backoff_base: Duration::from_secs(1),
            backoff_factor: 2.0,
            backoff_cap: Duration::from_secs(30),
        }
    }
}

/// Long-lived push connection to the exchange feed.
///
/// Runs on its own task; decoded events arrive on the receiver returned by
/// `connect`. Disconnects reconnect forever with capped exponential backoff;
/// only `close()` ends the channel.
pub struct RealtimeChannel {
    state_rx: watch::Receiver<ChannelState>,
    shutdown_tx: watch::Sender<bool>,
}

impl RealtimeChannel {
    /// Start the channel task; events are delivered on the returned receiver
    pub fn connect(config: ChannelConfig) -> Result<(Self, mpsc::UnboundedReceiver<ChannelEvent>)> {
        let url = Url::parse(&config.url)?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(run_channel(url, config, event_tx, state_tx, shutdown_rx));

        Ok((Self { state_rx, shutdown_tx }, event_rx))
    }

    /// Current connection state
    pub fn state(&self) -> ChannelState {
        *self.state_rx.borrow()
    }

    /// Watch handle for state transitions
    pub fn state_watch(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    /// Transition to `Closed` and suppress further reconnection attempts
    pub fn close(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

async fn run_channel(
    url: Url,
    config: ChannelConfig,
    event_tx: mpsc::UnboundedSender<ChannelEvent>,
    state_tx: watch::Sender<ChannelState>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut backoff = Backoff::new(config.backoff_base, config.backoff_factor, config.backoff_cap);
    let mut first_attempt = true;

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let _ = state_tx
            .send(if first_attempt { ChannelState::Connecting } else { ChannelState::Reconnecting });
        first_attempt = false;

        match connect_async(url.clone()).await {
            Ok((stream, _)) => {
                info!("Push channel open: {}", url);
                let _ = state_tx.send(ChannelState::Open);
                backoff.reset();

                let closed =
                    read_until_disconnect(stream, &event_tx, &mut shutdown_rx).await;
                if closed {
                    break;
                }
                warn!("Push channel disconnected, reconnecting");
            }
            Err(e) => {
                warn!("Push channel connect failed: {}", e);
            }
        }

        // Wait out the backoff, but wake immediately on close(). A dropped
        // sender means the handle is gone; stop instead of spinning.
        let delay = backoff.next_delay();
        debug!("Reconnecting in {:?}", delay);
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    let _ = state_tx.send(ChannelState::Closed);
    info!("Push channel closed");
}

/// Pump inbound messages until disconnect or shutdown.
/// Returns true when the channel was explicitly closed.
async fn read_until_disconnect(
    stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    event_tx: &mpsc::UnboundedSender<ChannelEvent>,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> bool {
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    let _ = write.send(Message::Close(None)).await;
                    return true;
                }
            }
            inbound = read.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        handle_text(&text, event_tx);
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = write.send(Message::Pong(payload)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => return false,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Push channel read error: {}", e);
                        return false;
                    }
                }
            }
        }
    }
}

fn handle_text(text: &str, event_tx: &mpsc::UnboundedSender<ChannelEvent>) {
    let message: PushMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            debug!("Ignoring undecodable push message: {}", e);
            return;
        }
    };

    if let Some(event) = message.into_event() {
        if event_tx.send(event).is_err() {
            debug!("Push event receiver dropped");
        }
    }
}
