//! Service wiring and lifecycle

use crate::config::ScreenerConfig;
use crate::fetch::FuturesClient;
use crate::pipeline::ScreeningPipeline;
use crate::status::ApiStatus;
use anyhow::{Context, Result};
use chrono::Utc;
use realtime_channel::{ChannelEvent, ChannelState, RealtimeChannel};
use screener_store::{HttpPersistence, PersistenceBackend, ScreenerStore};
use std::sync::Arc;
use std::time::Duration;
use ticker_cache::{IngestSource, MarketDataCache};
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Owns the screening components and their event loops.
///
/// Everything is constructed here and injected downward; `teardown` cancels
/// the polling timer, closes the push channel, and ensures in-flight fetches
/// are discarded rather than applied to a cache nobody is reading.
pub struct ScreenerService {
    config: ScreenerConfig,
    cache: Arc<MarketDataCache>,
    store: Arc<ScreenerStore>,
    pipeline: Arc<ScreeningPipeline>,
    channel: Option<RealtimeChannel>,
    handles: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
    last_error: Arc<RwLock<Option<String>>>,
}

impl ScreenerService {
    /// Create a service against the configured REST collaborator
    pub fn new(config: ScreenerConfig) -> Result<Self> {
        let backend = Arc::new(
            HttpPersistence::new(&config.feed.base_url)
                .context("Failed to create persistence client")?,
        );
        Ok(Self::with_backend(config, backend))
    }

    /// Create a service over an explicit persistence collaborator
    pub fn with_backend(config: ScreenerConfig, backend: Arc<dyn PersistenceBackend>) -> Self {
        let cache = Arc::new(MarketDataCache::new());
        let store = Arc::new(ScreenerStore::new(backend));
        let pipeline = Arc::new(ScreeningPipeline::new(cache.clone(), store.clone()));
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            cache,
            store,
            pipeline,
            channel: None,
            handles: Vec::new(),
            shutdown_tx,
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Load persisted state and start the polling and channel event loops
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting screener service for {}", self.config.user_id);

        if let Err(e) = self.store.init(&self.config.user_id).await {
            // Screeners load on the next successful call; the live feed
            // does not depend on them.
            warn!("Could not load persisted screeners: {}", e);
        }

        let (channel, events) = RealtimeChannel::connect(self.config.channel_config())
            .context("Failed to start push channel")?;
        self.channel = Some(channel);

        self.spawn_poll_loop()?;
        self.spawn_channel_loop(events)?;
        Ok(())
    }

    fn futures_client(&self) -> Result<FuturesClient> {
        FuturesClient::new(
            &self.config.feed.base_url,
            Duration::from_secs(self.config.feed.request_timeout_secs),
        )
    }

    fn spawn_poll_loop(&mut self) -> Result<()> {
        let client = self.futures_client()?;
        let cache = self.cache.clone();
        let poll_interval = Duration::from_secs(self.config.feed.poll_interval_secs);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        self.handles.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match client.fetch_tickers().await {
                            Ok(batch) => {
                                if *shutdown_rx.borrow() {
                                    // Completed after teardown; discard
                                    break;
                                }
                                cache.ingest(batch, IngestSource::Poll, Utc::now()).await;
                            }
                            Err(e) => {
                                warn!("Ticker poll failed, retaining last-good cache: {e:#}");
                            }
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("Poll loop stopped");
        }));
        Ok(())
    }

    fn spawn_channel_loop(&mut self, mut events: mpsc::UnboundedReceiver<ChannelEvent>) -> Result<()> {
        let client = self.futures_client()?;
        let cache = self.cache.clone();
        let last_error = self.last_error.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        self.handles.push(tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    event = events.recv() => match event {
                        Some(event) => event,
                        None => break,
                    },
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                };

                match event {
                    ChannelEvent::Ingest { tickers, timestamp } => {
                        cache.ingest(tickers, IngestSource::Push, timestamp).await;
                    }
                    ChannelEvent::RefreshRequested => match client.fetch_tickers().await {
                        Ok(batch) => {
                            if *shutdown_rx.borrow() {
                                break;
                            }
                            cache.ingest(batch, IngestSource::Push, Utc::now()).await;
                        }
                        Err(e) => {
                            warn!("Refresh fetch failed: {e:#}");
                        }
                    },
                    ChannelEvent::UpstreamError { message } => {
                        warn!("Push channel upstream error: {}", message);
                        let mut last_error = last_error.write().await;
                        *last_error = Some(message);
                    }
                }
            }
            info!("Channel event loop stopped");
        }));
        Ok(())
    }

    /// Cancel timers, close the push channel, and stop the event loops
    pub async fn teardown(&mut self) {
        info!("Tearing down screener service");
        let _ = self.shutdown_tx.send(true);
        if let Some(channel) = &self.channel {
            channel.close();
        }
        for handle in self.handles.drain(..) {
            let _ = handle.await;
        }
    }

    /// Current feed status
    pub async fn api_status(&self) -> ApiStatus {
        let connected =
            self.channel.as_ref().map(|c| c.state() == ChannelState::Open).unwrap_or(false);
        ApiStatus {
            api_connected: connected,
            last_update: self.cache.last_ingest().await,
            stale: self.cache.is_stale(self.config.stale_grace()).await,
            error: self.last_error.read().await.clone(),
        }
    }

    /// Shared market data cache
    pub fn cache(&self) -> Arc<MarketDataCache> {
        self.cache.clone()
    }

    /// Shared screener store
    pub fn store(&self) -> Arc<ScreenerStore> {
        self.store.clone()
    }

    /// Shared screening pipeline
    pub fn pipeline(&self) -> Arc<ScreeningPipeline> {
        self.pipeline.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screener_store::MemoryPersistence;

    fn test_config() -> ScreenerConfig {
        let mut config = ScreenerConfig::default();
        // Point at ports nothing listens on; loops must survive that
        config.feed.base_url = "http://127.0.0.1:1/api".to_string();
        config.feed.request_timeout_secs = 1;
        config.channel.url = "ws://127.0.0.1:1/ws".to_string();
        config
    }

    #[tokio::test]
    async fn test_start_and_teardown() {
        let mut service =
            ScreenerService::with_backend(test_config(), Arc::new(MemoryPersistence::new()));
        service.start().await.unwrap();

        let status = service.api_status().await;
        assert!(!status.api_connected);
        assert!(status.stale);

        service.teardown().await;
        assert!(service.handles.is_empty());
    }

    #[tokio::test]
    async fn test_status_reflects_cache_freshness() {
        let service =
            ScreenerService::with_backend(test_config(), Arc::new(MemoryPersistence::new()));

        let status = service.api_status().await;
        assert!(status.stale);
        assert!(status.last_update.is_none());

        let wire = ticker_cache::WireTicker {
            symbol: Some("BTCUSDT".to_string()),
            last_price: Some("50000".to_string()),
            ..Default::default()
        };
        service.cache().ingest(vec![wire], IngestSource::Poll, Utc::now()).await;

        let status = service.api_status().await;
        assert!(!status.stale);
        assert!(status.last_update.is_some());
    }
}
