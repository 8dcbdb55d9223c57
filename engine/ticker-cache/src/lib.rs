//! MarketDataCache - latest-known ticker records with dual-source reconciliation
//!
//! This crate holds the latest known market record per instrument symbol and
//! merges updates arriving from the polling feed and the push channel under a
//! monotonic-per-symbol timestamp rule.

pub mod cache;
pub mod error;
pub mod numeric;
pub mod types;

pub use cache::{CacheStats, IngestOutcome, IngestSource, MarketDataCache};
pub use error::CacheError;
pub use numeric::parse_or_zero;
pub use types::{TickerRecord, WireTicker};

// Result type alias
pub type Result<T> = std::result::Result<T, CacheError>;
