//! Parse-or-zero policy for exchange decimal strings
//!
//! The exchange reports every market number as a decimal string. Comparisons
//! across the engine treat an unparsable or missing value as 0 rather than an
//! error, so the policy lives here as a named function that tests can target
//! directly.

/// Parse an exchange decimal string, treating unparsable input as 0.
///
/// Non-finite results (NaN, infinities) also map to 0 so downstream
/// comparators never see them.
pub fn parse_or_zero(value: &str) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
