//! User-defined filter criteria

use serde::{Deserialize, Deserializer, Serialize};

/// A set of optional bounds AND-combined against a ticker record.
///
/// Absence of a bound means unrestricted on that side. Bounds persisted as
/// strings (older clients stored form input verbatim) deserialize leniently:
/// an unparsable bound becomes an unset bound, never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default, deserialize_with = "lenient_bound")]
    pub price_change_min: Option<f64>,

    #[serde(default, deserialize_with = "lenient_bound")]
    pub price_change_max: Option<f64>,

    #[serde(default, deserialize_with = "lenient_bound")]
    pub volume_min: Option<f64>,

    #[serde(default, deserialize_with = "lenient_bound")]
    pub volume_max: Option<f64>,

    #[serde(default, deserialize_with = "lenient_bound")]
    pub funding_rate_min: Option<f64>,

    #[serde(default, deserialize_with = "lenient_bound")]
    pub funding_rate_max: Option<f64>,

    #[serde(default, deserialize_with = "lenient_bound")]
    pub open_interest_min: Option<f64>,

    #[serde(default, deserialize_with = "lenient_bound")]
    pub open_interest_max: Option<f64>,

    /// Case-insensitive symbol search; `|` separates OR-alternatives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
}

impl FilterCriteria {
    /// Whether no bound and no search is set (the identity filter)
    pub fn is_empty(&self) -> bool {
        self.price_change_min.is_none()
            && self.price_change_max.is_none()
            && self.volume_min.is_none()
            && self.volume_max.is_none()
            && self.funding_rate_min.is_none()
            && self.funding_rate_max.is_none()
            && self.open_interest_min.is_none()
            && self.open_interest_max.is_none()
            && self.search_query.as_deref().map(str::trim).unwrap_or("").is_empty()
    }
}

/// Accept a number, a numeric string, or nothing; anything else is unset.
fn lenient_bound<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        // Catch-all so a bool/array/object bound is unset, not an error
        Other(serde_json::Value),
    }

    let bound = match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) if n.is_finite() => Some(n),
        Some(Raw::Text(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    };
    Ok(bound)
}
