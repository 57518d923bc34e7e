//! Durable storage for player progress and purchase records.
//!
//! The [`GameStore`] trait is the store contract; [`PgStore`] implements it
//! over PostgreSQL. The full-record `upsert_progress` path replaces the whole
//! row (callers always supply a complete record produced by the
//! reconciliation engine); `increment_coins` and `set_high_score_if_greater`
//! are single-statement atomic updates so the two high-frequency narrow paths
//! never race a read-merge-write cycle.

use core::fmt;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reef_schemas::{PlayerProgress, PurchaseRecord, StatusCheck};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgPoolOptions, PgPool};

mod pg;

pub use pg::PgStore;

pub const ENV_DB_URL: &str = "REEF_DATABASE_URL";

/// Purchase listings are capped to the most recent rows.
pub const PURCHASE_LIST_LIMIT: i64 = 100;

/// Status-check listings are capped.
pub const STATUS_CHECK_LIST_LIMIT: i64 = 1000;

/// Connect to Postgres using REEF_DATABASE_URL.
pub async fn connect_from_env() -> anyhow::Result<PgPool> {
    let url =
        std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Store-level failure taxonomy.
///
/// `NotFound` means the operation addressed a player id with no stored record
/// and is surfaced to clients as such; `Backend` is any storage failure and is
/// surfaced as a server error.
#[derive(Debug)]
pub enum StoreError {
    NotFound,
    Backend(anyhow::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "no stored record for this player"),
            StoreError::Backend(err) => write!(f, "store backend failure: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::NotFound => None,
            StoreError::Backend(err) => Some(err.as_ref()),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.into())
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        StoreError::Backend(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Contract types
// ---------------------------------------------------------------------------

/// A player's score together with its leaderboard rank.
///
/// Rank is dense: 1 + the number of records with a strictly greater
/// `high_score`, so tied scores share a rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedScore {
    pub user_id: String,
    pub high_score: i64,
    pub rank: i64,
}

/// Result of a conditional high-score update.
#[derive(Debug, Clone)]
pub struct HighScoreOutcome {
    /// The record after the update (`high_score` is the running maximum).
    pub progress: PlayerProgress,
    /// The score on file before the update.
    pub previous: i64,
}

impl HighScoreOutcome {
    /// True iff the submitted score strictly exceeded the previous one.
    pub fn is_new_record(&self) -> bool {
        self.progress.high_score > self.previous
    }
}

// ---------------------------------------------------------------------------
// Store contract
// ---------------------------------------------------------------------------

/// Keyed storage for progress records plus the two append-only collections.
///
/// Implementations must keep exactly one progress record per `user_id` and an
/// ordered secondary access path by `high_score` descending (ties broken by
/// `created_at` ascending, then `user_id` ascending — insertion order, made
/// total). `rank` and `top_by_score` must agree on that ordering.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Fetch the stored record, or `None` for a first-time player.
    async fn get_progress(&self, user_id: &str) -> StoreResult<Option<PlayerProgress>>;

    /// Replace the full record (insert on first sync). Never a partial write.
    async fn upsert_progress(&self, progress: &PlayerProgress) -> StoreResult<()>;

    /// Top `limit` records by descending `high_score`, stable tie-break.
    async fn top_by_score(&self, limit: i64) -> StoreResult<Vec<PlayerProgress>>;

    /// Dense 1-based rank of a player. `NotFound` if the player is absent.
    async fn rank(&self, user_id: &str) -> StoreResult<RankedScore>;

    /// Atomically add `delta` to `coins` and `total_coins_earned`.
    /// `NotFound` if the player is absent. Negative deltas are applied as
    /// given (the balance is not clamped).
    async fn increment_coins(
        &self,
        user_id: &str,
        delta: i64,
        now: DateTime<Utc>,
    ) -> StoreResult<PlayerProgress>;

    /// Atomically raise `high_score` to `score` if greater.
    /// `NotFound` if the player is absent.
    async fn set_high_score_if_greater(
        &self,
        user_id: &str,
        score: i64,
        now: DateTime<Utc>,
    ) -> StoreResult<HighScoreOutcome>;

    /// Targeted entitlement flip driven by purchase/refund events.
    /// A no-op for an unknown player (webhook semantics).
    async fn set_ads_removed(
        &self,
        user_id: &str,
        removed: bool,
        now: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Append one purchase log entry.
    async fn insert_purchase(&self, purchase: &PurchaseRecord) -> StoreResult<()>;

    /// Purchases for a player, newest first, capped at [`PURCHASE_LIST_LIMIT`].
    async fn purchases_for_user(&self, user_id: &str) -> StoreResult<Vec<PurchaseRecord>>;

    /// Append one status check.
    async fn insert_status_check(&self, check: &StatusCheck) -> StoreResult<()>;

    /// Stored status checks, capped at [`STATUS_CHECK_LIST_LIMIT`].
    async fn list_status_checks(&self) -> StoreResult<Vec<StatusCheck>>;
}
