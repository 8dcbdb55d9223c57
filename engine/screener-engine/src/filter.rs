//! Filter predicate evaluation

use crate::criteria::FilterCriteria;
use ticker_cache::TickerRecord;

/// Pure evaluation of a criteria set against a ticker record.
///
/// Numeric bounds are checked first (cheap comparisons), the symbol search
/// last. A record matches iff every defined bound is satisfied and, when a
/// search string is set, the search matches. Unparsable record fields
/// compare as 0 via the cache crate's parse-or-zero policy.
pub struct FilterPredicateEngine;

impl FilterPredicateEngine {
    /// Whether `record` satisfies `criteria`
    pub fn matches(record: &TickerRecord, criteria: &FilterCriteria) -> bool {
        if !Self::within(record.change(), criteria.price_change_min, criteria.price_change_max) {
            return false;
        }
        if !Self::within(record.volume(), criteria.volume_min, criteria.volume_max) {
            return false;
        }
        if !Self::within(record.funding(), criteria.funding_rate_min, criteria.funding_rate_max) {
            return false;
        }
        if !Self::within(
            record.open_interest(),
            criteria.open_interest_min,
            criteria.open_interest_max,
        ) {
            return false;
        }

        match criteria.search_query.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => Self::symbol_matches(&record.symbol, query),
            _ => true,
        }
    }

    fn within(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
        if let Some(min) = min {
            if value < min {
                return false;
            }
        }
        if let Some(max) = max {
            if value > max {
                return false;
            }
        }
        true
    }

    /// Case-insensitive substring match; `|` separates OR-alternatives
    /// (e.g. "BTC|ETH" matches any symbol containing either part).
    fn symbol_matches(symbol: &str, query: &str) -> bool {
        let symbol = symbol.to_lowercase();
        query
            .split('|')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .any(|part| symbol.contains(&part.to_lowercase()))
    }
}
