//! Screener and folder entities

use chrono::{DateTime, Utc};
use screener_engine::FilterCriteria;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Owner id used by single-user deployments
pub const DEFAULT_USER_ID: &str = "default-user";

/// A named, persisted criteria set owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screener {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub criteria: FilterCriteria,
    pub created_at: DateTime<Utc>,
}

impl Screener {
    /// Create a new screener with a fresh id
    pub fn new(user_id: &str, name: &str, criteria: FilterCriteria) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            criteria,
            created_at: Utc::now(),
        }
    }
}

/// A named, persisted grouping of instrument symbols, independent of
/// filter criteria. A symbol may belong to any number of folders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub color: String,
    pub trading_pairs: Vec<String>,
    pub is_starred: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Create a new empty folder with a fresh id
    pub fn new(user_id: &str, name: &str, color: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            trading_pairs: Vec::new(),
            is_starred: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Membership list with `symbol` appended if absent
    pub fn with_symbol(&self, symbol: &str) -> Vec<String> {
        let mut pairs = self.trading_pairs.clone();
        if !pairs.iter().any(|p| p == symbol) {
            pairs.push(symbol.to_string());
        }
        pairs
    }

    /// Membership list with `symbol` filtered out if present
    pub fn without_symbol(&self, symbol: &str) -> Vec<String> {
        self.trading_pairs.iter().filter(|p| p.as_str() != symbol).cloned().collect()
    }
}

/// State of the most recent mutation round-trip for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationState {
    /// No mutation in flight or attempted
    #[default]
    Idle,
    /// Round-trip submitted, collaborator has not confirmed yet
    Pending,
    /// Collaborator confirmed the last mutation
    Confirmed,
    /// Collaborator rejected the last mutation; confirmed state retained
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_symbol_is_idempotent() {
        let mut folder = Folder::new(DEFAULT_USER_ID, "Majors", "#3b82f6");
        folder.trading_pairs = vec!["BTCUSDT".to_string()];

        let pairs = folder.with_symbol("BTCUSDT");
        assert_eq!(pairs, vec!["BTCUSDT".to_string()]);

        let pairs = folder.with_symbol("ETHUSDT");
        assert_eq!(pairs, vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]);
    }

    #[test]
    fn test_without_symbol_on_non_member_is_noop() {
        let mut folder = Folder::new(DEFAULT_USER_ID, "Majors", "#3b82f6");
        folder.trading_pairs = vec!["BTCUSDT".to_string()];

        assert_eq!(folder.without_symbol("ETHUSDT"), vec!["BTCUSDT".to_string()]);
        assert!(folder.without_symbol("BTCUSDT").is_empty());
    }

    #[test]
    fn test_screener_serializes_camel_case() {
        let screener = Screener::new(DEFAULT_USER_ID, "Movers", Default::default());
        let json = serde_json::to_value(&screener).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
