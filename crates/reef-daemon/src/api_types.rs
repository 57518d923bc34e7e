//! Request and response types for all reef-daemon HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded
//! by Axum and decoded by tests. No business logic lives here; the full
//! progress record on the wire is `reef_schemas::PlayerProgress` itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GET /api/  and  GET /api/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub version: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// POST /api/status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCheckCreate {
    pub client_name: String,
}

// ---------------------------------------------------------------------------
// POST /api/game/{user_id}/coins/add
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AddCoinsQuery {
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCoinsResponse {
    pub success: bool,
    /// New balance after the grant.
    pub coins: i64,
    pub added: i64,
}

// ---------------------------------------------------------------------------
// POST /api/game/{user_id}/highscore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HighScoreQuery {
    pub score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighScoreResponse {
    pub success: bool,
    /// Score on file after the submission (the running maximum).
    pub high_score: i64,
    pub previous: i64,
    pub is_new_record: bool,
}

// ---------------------------------------------------------------------------
// GET /api/leaderboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// POST /api/purchases/record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseCreate {
    pub user_id: String,
    pub product_id: String,
    pub transaction_id: String,
    /// 'ios' or 'android'.
    pub platform: String,
    pub amount: Option<f64>,
    pub currency: Option<String>,
}

// ---------------------------------------------------------------------------
// POST /api/webhook/revenuecat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

// ---------------------------------------------------------------------------
// Client-error body (404 and 500)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
