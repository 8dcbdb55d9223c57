//! REST ticker feed client

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use ticker_cache::WireTicker;
use tracing::debug;

/// Client for the primary ticker feed (`GET {base}/futures`)
pub struct FuturesClient {
    client: Client,
    base_url: String,
}

impl FuturesClient {
    /// Create a new feed client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client =
            Client::builder().timeout(timeout).build().context("Failed to create HTTP client")?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    /// Fetch the full futures ticker list
    pub async fn fetch_tickers(&self) -> Result<Vec<WireTicker>> {
        let url = format!("{}/futures", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch futures tickers")?;

        if !response.status().is_success() {
            anyhow::bail!("Futures request failed with status: {}", response.status());
        }

        let tickers: Vec<WireTicker> =
            response.json().await.context("Failed to parse futures tickers JSON")?;

        debug!("Fetched {} futures tickers", tickers.len());
        Ok(tickers)
    }
}
