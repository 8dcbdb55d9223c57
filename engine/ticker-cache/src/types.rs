//! Ticker record types

use crate::error::CacheError;
use crate::numeric::parse_or_zero;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ticker object as the exchange feed delivers it
///
/// Every market number arrives as a decimal string; fields other than the
/// symbol may be missing entirely on partial feeds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTicker {
    /// Instrument symbol (e.g. "BTCUSDT")
    pub symbol: Option<String>,

    /// Last traded price
    #[serde(alias = "lastPr")]
    pub last_price: Option<String>,

    /// Signed 24h change percentage
    #[serde(alias = "chg24h")]
    pub change_24h: Option<String>,

    /// 24h quote volume
    pub volume_24h: Option<String>,

    /// Current funding rate
    pub funding_rate: Option<String>,

    /// Open interest
    pub open_interest: Option<String>,

    /// Contract type (e.g. "perpetual")
    pub contract_type: Option<String>,
}

/// Latest known market snapshot for one instrument symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerRecord {
    /// Instrument symbol, unique key in the cache
    pub symbol: String,

    /// Last traded price (exchange decimal string)
    pub last_price: String,

    /// Signed 24h change percentage
    pub change_24h: String,

    /// 24h quote volume
    pub volume_24h: String,

    /// Current funding rate
    pub funding_rate: String,

    /// Open interest
    pub open_interest: String,

    /// Contract type
    pub contract_type: String,

    /// Timestamp the record was produced at
    pub last_updated: DateTime<Utc>,
}

impl TickerRecord {
    /// Validate a wire ticker into a cacheable record.
    ///
    /// A record is malformed when the symbol is missing/empty or the last
    /// price does not parse as a finite number. All other numeric fields are
    /// left as delivered and fall under the parse-or-zero comparison policy.
    pub fn from_wire(wire: WireTicker, timestamp: DateTime<Utc>) -> Result<Self, CacheError> {
        let symbol = match wire.symbol {
            Some(s) if !s.trim().is_empty() => s,
            _ => {
                return Err(CacheError::MalformedRecord { reason: "missing symbol".to_string() })
            }
        };

        let last_price = wire.last_price.unwrap_or_default();
        if !matches!(last_price.trim().parse::<f64>(), Ok(v) if v.is_finite()) {
            return Err(CacheError::MalformedRecord {
                reason: format!("non-numeric last price for {symbol}: {last_price:?}"),
            });
        }

        Ok(Self {
            symbol,
            last_price,
            change_24h: wire.change_24h.unwrap_or_default(),
            volume_24h: wire.volume_24h.unwrap_or_default(),
            funding_rate: wire.funding_rate.unwrap_or_default(),
            open_interest: wire.open_interest.unwrap_or_default(),
            contract_type: wire.contract_type.unwrap_or_default(),
            last_updated: timestamp,
        })
    }

    /// Last price under the parse-or-zero policy
    pub fn price(&self) -> f64 {
        parse_or_zero(&self.last_price)
    }

    /// 24h change under the parse-or-zero policy
    pub fn change(&self) -> f64 {
        parse_or_zero(&self.change_24h)
    }

    /// 24h volume under the parse-or-zero policy
    pub fn volume(&self) -> f64 {
        parse_or_zero(&self.volume_24h)
    }

    /// Funding rate under the parse-or-zero policy
    pub fn funding(&self) -> f64 {
        parse_or_zero(&self.funding_rate)
    }

    /// Open interest under the parse-or-zero policy
    pub fn open_interest(&self) -> f64 {
        parse_or_zero(&self.open_interest)
    }
}
