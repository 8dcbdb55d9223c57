//! Market data cache with monotonic-per-symbol reconciliation

use crate::error::CacheError;
use crate::types::{TickerRecord, WireTicker};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Source of an ingestion batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestSource {
    /// Scheduled REST poll
    Poll,
    /// Push channel payload
    Push,
}

/// Outcome of one ingestion batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Records applied to the cache
    pub applied: usize,
    /// Records skipped because the cached timestamp was newer
    pub skipped_stale: usize,
    /// Records dropped as malformed
    pub dropped_malformed: usize,
}

/// Latest-known record per instrument symbol.
///
/// Mutated only through `ingest`; read by any number of consumers. Records
/// are keyed in a `BTreeMap` so snapshots come out in a deterministic order
/// for the stable sort downstream to preserve.
pub struct MarketDataCache {
    records: Arc<RwLock<BTreeMap<String, TickerRecord>>>,
    generation: Arc<RwLock<u64>>,
    last_ingest: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl Default for MarketDataCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketDataCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(BTreeMap::new())),
            generation: Arc::new(RwLock::new(0)),
            last_ingest: Arc::new(RwLock::new(None)),
        }
    }

    /// Ingest a batch of wire tickers stamped with the batch timestamp.
    ///
    /// Each record replaces the cached one for its symbol only if the
    /// incoming timestamp is not older than the cached one. Symbols absent
    /// from the batch are left untouched; the cache never shrinks from a
    /// partial batch. Malformed records are dropped individually and do not
    /// fail the batch.
    pub async fn ingest(
        &self,
        batch: Vec<WireTicker>,
        source: IngestSource,
        timestamp: DateTime<Utc>,
    ) -> IngestOutcome {
        let mut outcome = IngestOutcome::default();
        let mut records = self.records.write().await;

        for wire in batch {
            let incoming = match TickerRecord::from_wire(wire, timestamp) {
                Ok(record) => record,
                Err(CacheError::MalformedRecord { reason }) => {
                    warn!("Dropping malformed record from {:?} batch: {}", source, reason);
                    outcome.dropped_malformed += 1;
                    continue;
                }
            };

            match records.get(&incoming.symbol) {
                Some(cached) if cached.last_updated > incoming.last_updated => {
                    debug!(
                        "Skipping stale {:?} update for {} ({} > {})",
                        source, incoming.symbol, cached.last_updated, incoming.last_updated
                    );
                    outcome.skipped_stale += 1;
                }
                _ => {
                    records.insert(incoming.symbol.clone(), incoming);
                    outcome.applied += 1;
                }
            }
        }

        drop(records);

        if outcome.applied > 0 {
            let mut generation = self.generation.write().await;
            *generation += 1;
            let mut last_ingest = self.last_ingest.write().await;
            *last_ingest = Some(Utc::now());
            debug!(
                "Ingested {} records from {:?} (generation {})",
                outcome.applied, source, *generation
            );
        }

        outcome
    }

    /// Current set of records in deterministic symbol order
    pub async fn snapshot(&self) -> Vec<TickerRecord> {
        let records = self.records.read().await;
        records.values().cloned().collect()
    }

    /// Latest record for one symbol
    pub async fn get(&self, symbol: &str) -> Option<TickerRecord> {
        let records = self.records.read().await;
        records.get(symbol).cloned()
    }

    /// Generation counter, bumped whenever an ingest applied at least one
    /// record. Consumers compare generations to detect "nothing changed".
    pub async fn generation(&self) -> u64 {
        *self.generation.read().await
    }

    /// Whether the cache has gone stale: no successful ingestion within the
    /// grace period. An empty cache that has never ingested is stale.
    pub async fn is_stale(&self, grace: Duration) -> bool {
        let last_ingest = self.last_ingest.read().await;
        match *last_ingest {
            Some(at) => Utc::now() - at > grace,
            None => true,
        }
    }

    /// Timestamp of the last successful ingestion
    pub async fn last_ingest(&self) -> Option<DateTime<Utc>> {
        *self.last_ingest.read().await
    }

    /// Cache statistics
    pub async fn stats(&self) -> CacheStats {
        let records = self.records.read().await;
        CacheStats {
            size: records.len(),
            generation: *self.generation.read().await,
            last_ingest: *self.last_ingest.read().await,
        }
    }
}

/// Point-in-time cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub size: usize,
    pub generation: u64,
    pub last_ingest: Option<DateTime<Utc>>,
}
