//! Shared domain types for the reef backend.
//!
//! Pure data: serde-serializable structs only, no I/O and no merge logic
//! (that lives in `reef-reconcile`).

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Skin every player owns from the first launch. Never evicted by a merge.
pub const DEFAULT_SKIN: &str = "default";

fn default_skin_set() -> BTreeSet<String> {
    let mut s = BTreeSet::new();
    s.insert(DEFAULT_SKIN.to_string());
    s
}

fn default_skin_name() -> String {
    DEFAULT_SKIN.to_string()
}

/// Full progress snapshot submitted by a client at sync time.
///
/// Every field carries a serde default so a sparse client payload decodes to
/// the same values a fresh install would submit. Collections are B-tree
/// backed for deterministic iteration and serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub user_id: String,
    #[serde(default)]
    pub high_score: i64,
    #[serde(default)]
    pub coins: i64,
    #[serde(default = "default_skin_set")]
    pub unlocked_skins: BTreeSet<String>,
    #[serde(default = "default_skin_name")]
    pub selected_skin: String,
    #[serde(default)]
    pub owned_power_ups: BTreeMap<String, i64>,
    #[serde(default)]
    pub ads_removed: bool,
    #[serde(default)]
    pub total_games_played: i64,
    #[serde(default)]
    pub total_coins_earned: i64,
    #[serde(default)]
    pub unlocked_achievements: BTreeSet<String>,
    #[serde(default)]
    pub achievement_stats: BTreeMap<String, i64>,
}

impl ProgressSnapshot {
    /// Fresh-install snapshot for `user_id` (all defaults applied).
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            high_score: 0,
            coins: 0,
            unlocked_skins: default_skin_set(),
            selected_skin: default_skin_name(),
            owned_power_ups: BTreeMap::new(),
            ads_removed: false,
            total_games_played: 0,
            total_coins_earned: 0,
            unlocked_achievements: BTreeSet::new(),
            achievement_stats: BTreeMap::new(),
        }
    }
}

/// Canonical stored progress record — one per player, keyed by `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProgress {
    pub user_id: String,
    pub high_score: i64,
    pub coins: i64,
    pub unlocked_skins: BTreeSet<String>,
    pub selected_skin: String,
    pub owned_power_ups: BTreeMap<String, i64>,
    pub ads_removed: bool,
    pub total_games_played: i64,
    pub total_coins_earned: i64,
    pub unlocked_achievements: BTreeSet<String>,
    pub achievement_stats: BTreeMap<String, i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read-only leaderboard projection of a progress record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub username: Option<String>,
    pub high_score: i64,
    /// 1-based dense rank by descending `high_score`.
    pub rank: i64,
}

/// Append-only purchase log entry. No merge semantics — pure insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: Uuid,
    pub user_id: String,
    pub product_id: String,
    pub transaction_id: String,
    /// Store platform tag, e.g. "ios" | "android" | "app_store".
    pub platform: String,
    /// Set when the record originates from a subscription-platform webhook.
    pub event_type: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Connectivity ping logged by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCheck {
    pub id: Uuid,
    pub client_name: String,
    pub ts_utc: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_snapshot_decodes_with_defaults() {
        let snap: ProgressSnapshot =
            serde_json::from_str(r#"{"user_id":"u1"}"#).expect("decode sparse snapshot");
        assert_eq!(snap, ProgressSnapshot::new("u1"));
        assert!(snap.unlocked_skins.contains(DEFAULT_SKIN));
        assert_eq!(snap.selected_skin, DEFAULT_SKIN);
    }

    #[test]
    fn snapshot_roundtrips_collections_in_stable_order() {
        let mut snap = ProgressSnapshot::new("u2");
        snap.unlocked_skins.insert("shark".to_string());
        snap.unlocked_skins.insert("angler".to_string());
        snap.achievement_stats.insert("games_won".to_string(), 3);

        let json = serde_json::to_string(&snap).expect("encode");
        let back: ProgressSnapshot = serde_json::from_str(&json).expect("decode");
        assert_eq!(back, snap);
        // BTreeSet serializes sorted: angler < default < shark.
        assert!(json.find("angler").unwrap() < json.find("shark").unwrap());
    }
}
