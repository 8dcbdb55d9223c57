//! Screening pipeline: cache → filter → sort

use screener_engine::{FilterCriteria, FilterPredicateEngine, SortEngine, SortField, SortState};
use screener_store::{Result as StoreResult, Screener, ScreenerStore, StoreError};
use std::sync::Arc;
use ticker_cache::{MarketDataCache, TickerRecord};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Memoized output keyed on the pipeline's inputs
#[derive(Debug, Clone)]
struct Memo {
    generation: u64,
    criteria_rev: u64,
    results: Vec<TickerRecord>,
}

#[derive(Debug)]
struct PipelineInputs {
    /// Criteria of the selected screener, when one is selected
    selected: Option<Screener>,

    /// Ad hoc criteria used while no screener is selected
    ad_hoc: FilterCriteria,

    /// Active sort field and direction
    sort: SortState,

    /// Bumped on every criteria/sort change
    criteria_rev: u64,

    memo: Option<Memo>,
}

/// Composes cache, filter engine, sort engine, and screener selection.
///
/// The visible result is a pure function of (cache generation, active
/// criteria, sort field, sort direction). `results()` recomputes only when
/// one of those inputs changed since the memoized run, always from the
/// latest inputs; bursts of near-simultaneous changes collapse into a single
/// recomputation at the next read.
pub struct ScreeningPipeline {
    cache: Arc<MarketDataCache>,
    store: Arc<ScreenerStore>,
    inputs: RwLock<PipelineInputs>,
}

impl ScreeningPipeline {
    /// Create a pipeline over a cache and store
    pub fn new(cache: Arc<MarketDataCache>, store: Arc<ScreenerStore>) -> Self {
        Self {
            cache,
            store,
            inputs: RwLock::new(PipelineInputs {
                selected: None,
                ad_hoc: FilterCriteria::default(),
                sort: SortState::default(),
                criteria_rev: 0,
                memo: None,
            }),
        }
    }

    /// The criteria the next evaluation will use: the selected screener's,
    /// or the ad hoc criteria when nothing is selected.
    pub async fn active_criteria(&self) -> FilterCriteria {
        let inputs = self.inputs.read().await;
        match &inputs.selected {
            Some(screener) => screener.criteria.clone(),
            None => inputs.ad_hoc.clone(),
        }
    }

    /// Currently selected screener id, if any
    pub async fn selected_screener(&self) -> Option<String> {
        let inputs = self.inputs.read().await;
        inputs.selected.as_ref().map(|s| s.id.clone())
    }

    /// Select a stored screener as the active criteria source
    pub async fn select_screener(&self, id: &str) -> StoreResult<()> {
        let screener = self
            .store
            .get_screener(id)
            .await
            .ok_or_else(|| StoreError::ScreenerNotFound { id: id.to_string() })?;

        let mut inputs = self.inputs.write().await;
        info!("Selecting screener {} ({})", screener.name, screener.id);
        inputs.selected = Some(screener);
        inputs.criteria_rev += 1;
        Ok(())
    }

    /// Clear the selection; evaluation falls back to the ad hoc criteria
    pub async fn clear_selection(&self) {
        let mut inputs = self.inputs.write().await;
        if inputs.selected.take().is_some() {
            inputs.criteria_rev += 1;
        }
    }

    /// Replace the ad hoc criteria; clears any screener selection
    pub async fn set_criteria(&self, criteria: FilterCriteria) {
        let mut inputs = self.inputs.write().await;
        inputs.selected = None;
        inputs.ad_hoc = criteria;
        inputs.criteria_rev += 1;
    }

    /// Replace a stored screener's criteria wholesale. When the screener is
    /// the selected one, the selection follows the confirmed update.
    pub async fn update_screener(&self, id: &str, criteria: FilterCriteria) -> StoreResult<Screener> {
        let confirmed = self.store.update_screener(id, criteria).await?;

        let mut inputs = self.inputs.write().await;
        if inputs.selected.as_ref().map(|s| s.id.as_str()) == Some(id) {
            inputs.selected = Some(confirmed.clone());
            inputs.criteria_rev += 1;
        }
        Ok(confirmed)
    }

    /// Delete a stored screener. If it is the selected one, the selection is
    /// cleared in the same call, so the next evaluation uses the identity
    /// criteria rather than a dangling reference.
    pub async fn delete_screener(&self, id: &str) -> StoreResult<()> {
        self.store.delete_screener(id).await?;

        let mut inputs = self.inputs.write().await;
        if inputs.selected.as_ref().map(|s| s.id.as_str()) == Some(id) {
            inputs.selected = None;
            inputs.ad_hoc = FilterCriteria::default();
            inputs.criteria_rev += 1;
        }
        Ok(())
    }

    /// Apply a sort header toggle
    pub async fn toggle_sort(&self, field: SortField) {
        let mut inputs = self.inputs.write().await;
        inputs.sort.toggle(field);
        inputs.criteria_rev += 1;
    }

    /// Active sort field and direction
    pub async fn sort_state(&self) -> SortState {
        self.inputs.read().await.sort
    }

    /// The visible, filtered, sorted result set.
    ///
    /// Returns the memoized output when neither the cache generation nor the
    /// criteria/sort revision moved since the last computation.
    pub async fn results(&self) -> Vec<TickerRecord> {
        let generation = self.cache.generation().await;

        {
            let inputs = self.inputs.read().await;
            if let Some(memo) = &inputs.memo {
                if memo.generation == generation && memo.criteria_rev == inputs.criteria_rev {
                    return memo.results.clone();
                }
            }
        }

        let snapshot = self.cache.snapshot().await;
        let mut inputs = self.inputs.write().await;

        let criteria = match &inputs.selected {
            Some(screener) => screener.criteria.clone(),
            None => inputs.ad_hoc.clone(),
        };

        let mut results: Vec<TickerRecord> = snapshot
            .into_iter()
            .filter(|record| FilterPredicateEngine::matches(record, &criteria))
            .collect();
        SortEngine::sort(&mut results, inputs.sort);

        debug!(
            "Recomputed screening results: {} records (generation {}, rev {})",
            results.len(),
            generation,
            inputs.criteria_rev
        );

        inputs.memo =
            Some(Memo { generation, criteria_rev: inputs.criteria_rev, results: results.clone() });
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use screener_engine::SortDirection;
    use screener_store::{MemoryPersistence, DEFAULT_USER_ID};
    use ticker_cache::{IngestSource, WireTicker};

    fn wire(symbol: &str, price: &str, change: &str, volume: &str) -> WireTicker {
        WireTicker {
            symbol: Some(symbol.to_string()),
            last_price: Some(price.to_string()),
            change_24h: Some(change.to_string()),
            volume_24h: Some(volume.to_string()),
            funding_rate: Some("0.0001".to_string()),
            open_interest: Some("100".to_string()),
            contract_type: Some("perpetual".to_string()),
        }
    }

    async fn pipeline_with_data() -> (ScreeningPipeline, Arc<MarketDataCache>, Arc<ScreenerStore>) {
        let cache = Arc::new(MarketDataCache::new());
        cache
            .ingest(
                vec![
                    wire("BTCUSDT", "50000", "5.2", "2e9"),
                    wire("ETHUSDT", "3000", "-1.2", "9e8"),
                    wire("SOLUSDT", "150", "8.0", "5e8"),
                ],
                IngestSource::Poll,
                Utc::now(),
            )
            .await;

        let store = Arc::new(ScreenerStore::new(Arc::new(MemoryPersistence::new())));
        let pipeline = ScreeningPipeline::new(cache.clone(), store.clone());
        (pipeline, cache, store)
    }

    fn symbols(records: &[TickerRecord]) -> Vec<&str> {
        records.iter().map(|r| r.symbol.as_str()).collect()
    }

    #[tokio::test]
    async fn test_identity_criteria_passes_everything_sorted_by_volume() {
        let (pipeline, _, _) = pipeline_with_data().await;
        let results = pipeline.results().await;
        assert_eq!(symbols(&results), vec!["BTCUSDT", "ETHUSDT", "SOLUSDT"]);
    }

    #[tokio::test]
    async fn test_criteria_narrow_the_result() {
        let (pipeline, _, _) = pipeline_with_data().await;

        pipeline
            .set_criteria(FilterCriteria { price_change_min: Some(3.0), ..Default::default() })
            .await;
        assert_eq!(symbols(&pipeline.results().await), vec!["BTCUSDT", "SOLUSDT"]);

        pipeline
            .set_criteria(FilterCriteria { price_change_min: Some(6.0), ..Default::default() })
            .await;
        assert_eq!(symbols(&pipeline.results().await), vec!["SOLUSDT"]);
    }

    #[tokio::test]
    async fn test_memo_skips_recompute_until_inputs_change() {
        let (pipeline, cache, _) = pipeline_with_data().await;

        let first = pipeline.results().await;
        let second = pipeline.results().await;
        assert_eq!(symbols(&first), symbols(&second));

        // New data moves the generation and shows up on the next read
        cache
            .ingest(vec![wire("XRPUSDT", "2", "1.0", "3e9")], IngestSource::Push, Utc::now())
            .await;
        let third = pipeline.results().await;
        assert_eq!(symbols(&third), vec!["XRPUSDT", "BTCUSDT", "ETHUSDT", "SOLUSDT"]);
    }

    #[tokio::test]
    async fn test_toggle_sort_flips_and_resets() {
        let (pipeline, _, _) = pipeline_with_data().await;

        pipeline.toggle_sort(SortField::Volume24h).await;
        let state = pipeline.sort_state().await;
        assert_eq!(state.direction, SortDirection::Ascending);
        assert_eq!(symbols(&pipeline.results().await), vec!["SOLUSDT", "ETHUSDT", "BTCUSDT"]);

        pipeline.toggle_sort(SortField::Change24h).await;
        let state = pipeline.sort_state().await;
        assert_eq!(state.field, SortField::Change24h);
        assert_eq!(state.direction, SortDirection::Descending);
        assert_eq!(symbols(&pipeline.results().await), vec!["SOLUSDT", "BTCUSDT", "ETHUSDT"]);
    }

    #[tokio::test]
    async fn test_selected_screener_drives_criteria() {
        let (pipeline, _, store) = pipeline_with_data().await;
        let screener = store
            .create_screener(
                DEFAULT_USER_ID,
                "Gainers",
                FilterCriteria { price_change_min: Some(3.0), ..Default::default() },
            )
            .await
            .unwrap();

        pipeline.select_screener(&screener.id).await.unwrap();
        assert_eq!(symbols(&pipeline.results().await), vec!["BTCUSDT", "SOLUSDT"]);
    }

    #[tokio::test]
    async fn test_deleting_selected_screener_clears_selection() {
        let (pipeline, _, store) = pipeline_with_data().await;
        let screener = store
            .create_screener(
                DEFAULT_USER_ID,
                "Gainers",
                FilterCriteria { price_change_min: Some(6.0), ..Default::default() },
            )
            .await
            .unwrap();

        pipeline.select_screener(&screener.id).await.unwrap();
        assert_eq!(symbols(&pipeline.results().await), vec!["SOLUSDT"]);

        pipeline.delete_screener(&screener.id).await.unwrap();
        assert_eq!(pipeline.selected_screener().await, None);
        // Next evaluation uses the identity criteria
        assert_eq!(
            symbols(&pipeline.results().await),
            vec!["BTCUSDT", "ETHUSDT", "SOLUSDT"]
        );
    }

    #[tokio::test]
    async fn test_failed_screener_update_keeps_displayed_criteria() {
        let cache = Arc::new(MarketDataCache::new());
        cache
            .ingest(vec![wire("BTCUSDT", "50000", "5.2", "2e9")], IngestSource::Poll, Utc::now())
            .await;

        let backend = Arc::new(MemoryPersistence::new());
        let store = Arc::new(ScreenerStore::new(backend.clone()));
        let pipeline = ScreeningPipeline::new(cache, store.clone());

        let screener = store
            .create_screener(
                DEFAULT_USER_ID,
                "Gainers",
                FilterCriteria { price_change_min: Some(3.0), ..Default::default() },
            )
            .await
            .unwrap();
        pipeline.select_screener(&screener.id).await.unwrap();

        backend.fail_next_mutation();
        let result = pipeline
            .update_screener(
                &screener.id,
                FilterCriteria { price_change_min: Some(99.0), ..Default::default() },
            )
            .await;
        assert!(result.is_err());

        // The previously confirmed criteria still drive the view
        assert_eq!(pipeline.active_criteria().await.price_change_min, Some(3.0));
        assert_eq!(symbols(&pipeline.results().await), vec!["BTCUSDT"]);
    }

    #[tokio::test]
    async fn test_confirmed_update_of_selected_screener_is_applied() {
        let (pipeline, _, store) = pipeline_with_data().await;
        let screener = store
            .create_screener(
                DEFAULT_USER_ID,
                "Gainers",
                FilterCriteria { price_change_min: Some(3.0), ..Default::default() },
            )
            .await
            .unwrap();
        pipeline.select_screener(&screener.id).await.unwrap();

        pipeline
            .update_screener(
                &screener.id,
                FilterCriteria { price_change_min: Some(6.0), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(symbols(&pipeline.results().await), vec!["SOLUSDT"]);
    }
}
