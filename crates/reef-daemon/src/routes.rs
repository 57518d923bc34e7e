//! Axum router and all HTTP handlers for reef-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. All handlers are `pub(crate)` so the scenario tests in
//! `tests/` can compose the router directly.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use reef_db::{RankedScore, StoreError};
use reef_reconcile::merge;
use reef_schemas::{LeaderboardEntry, PlayerProgress, ProgressSnapshot, PurchaseRecord, StatusCheck};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    api_types::{
        AddCoinsQuery, AddCoinsResponse, ErrorBody, HealthResponse, HighScoreQuery,
        HighScoreResponse, LeaderboardQuery, PurchaseCreate, RootResponse, StatusCheckCreate,
        WebhookAck,
    },
    state::AppState,
    webhook,
};

/// Leaderboard page size when the client does not pass `limit`.
const DEFAULT_LEADERBOARD_LIMIT: i64 = 100;

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// HTTP-surface error: `NotFound` becomes a 404 with a client-readable
/// detail; everything else is a 500 with the cause logged, never leaked.
pub enum ApiError {
    NotFound(&'static str),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(detail) => (
                StatusCode::NOT_FOUND,
                Json(ErrorBody {
                    detail: detail.to_string(),
                }),
            )
                .into_response(),
            ApiError::Internal(err) => {
                error!(error = %format!("{err:#}"), "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        detail: "internal error".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("User not found"),
            StoreError::Backend(cause) => ApiError::Internal(cause),
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/", get(root))
        .route("/api/health", get(health))
        .route(
            "/api/status",
            post(create_status_check).get(list_status_checks),
        )
        .route("/api/game/sync", post(sync_game_data))
        .route("/api/game/:user_id", get(get_game_data))
        .route("/api/game/:user_id/coins/add", post(add_coins))
        .route("/api/game/:user_id/highscore", post(update_high_score))
        .route("/api/leaderboard", get(leaderboard))
        .route("/api/leaderboard/:user_id/rank", get(user_rank))
        .route("/api/purchases/record", post(record_purchase))
        .route("/api/purchases/:user_id", get(user_purchases))
        .route("/api/webhook/revenuecat", post(revenuecat_webhook))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /api/  and  GET /api/health
// ---------------------------------------------------------------------------

pub(crate) async fn root(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    Json(RootResponse {
        message: format!("{} API", st.build.service),
        version: st.build.version,
    })
}

pub(crate) async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
    })
}

// ---------------------------------------------------------------------------
// POST /api/status  and  GET /api/status
// ---------------------------------------------------------------------------

pub(crate) async fn create_status_check(
    State(st): State<Arc<AppState>>,
    Json(input): Json<StatusCheckCreate>,
) -> Result<Json<StatusCheck>, ApiError> {
    let check = StatusCheck {
        id: Uuid::new_v4(),
        client_name: input.client_name,
        ts_utc: Utc::now(),
    };
    st.store.insert_status_check(&check).await?;
    Ok(Json(check))
}

pub(crate) async fn list_status_checks(
    State(st): State<Arc<AppState>>,
) -> Result<Json<Vec<StatusCheck>>, ApiError> {
    Ok(Json(st.store.list_status_checks().await?))
}

// ---------------------------------------------------------------------------
// POST /api/game/sync
// ---------------------------------------------------------------------------

/// Full reconciliation: fetch the stored record, merge the incoming snapshot
/// per the field-level policy, persist the result.
///
/// The read-merge-write is deliberately unlocked: concurrent syncs for the
/// same player race and the last writer's merge result wins, computed against
/// whichever snapshot it read. The merge-policy fields (max counters, set
/// unions, sticky flags) are what make that race lossless for progress.
pub(crate) async fn sync_game_data(
    State(st): State<Arc<AppState>>,
    Json(snapshot): Json<ProgressSnapshot>,
) -> Result<Json<PlayerProgress>, ApiError> {
    let existing = st.store.get_progress(&snapshot.user_id).await?;
    let merged = merge(existing.as_ref(), snapshot, Utc::now());
    st.store.upsert_progress(&merged).await?;

    info!(user_id = %merged.user_id, high_score = merged.high_score, "game/sync");
    Ok(Json(merged))
}

// ---------------------------------------------------------------------------
// GET /api/game/{user_id}
// ---------------------------------------------------------------------------

pub(crate) async fn get_game_data(
    State(st): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<PlayerProgress>, ApiError> {
    let progress = st
        .store
        .get_progress(&user_id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;
    Ok(Json(progress))
}

// ---------------------------------------------------------------------------
// POST /api/game/{user_id}/coins/add
// ---------------------------------------------------------------------------

pub(crate) async fn add_coins(
    State(st): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(q): Query<AddCoinsQuery>,
) -> Result<Json<AddCoinsResponse>, ApiError> {
    let updated = st.store.increment_coins(&user_id, q.amount, Utc::now()).await?;

    info!(user_id = %user_id, added = q.amount, "coins/add");
    Ok(Json(AddCoinsResponse {
        success: true,
        coins: updated.coins,
        added: q.amount,
    }))
}

// ---------------------------------------------------------------------------
// POST /api/game/{user_id}/highscore
// ---------------------------------------------------------------------------

pub(crate) async fn update_high_score(
    State(st): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(q): Query<HighScoreQuery>,
) -> Result<Json<HighScoreResponse>, ApiError> {
    let outcome = st
        .store
        .set_high_score_if_greater(&user_id, q.score, Utc::now())
        .await?;

    info!(
        user_id = %user_id,
        submitted = q.score,
        is_new_record = outcome.is_new_record(),
        "highscore"
    );
    Ok(Json(HighScoreResponse {
        success: true,
        high_score: outcome.progress.high_score,
        previous: outcome.previous,
        is_new_record: outcome.is_new_record(),
    }))
}

// ---------------------------------------------------------------------------
// GET /api/leaderboard
// ---------------------------------------------------------------------------

pub(crate) async fn leaderboard(
    State(st): State<Arc<AppState>>,
    Query(q): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let limit = q.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    let top = st.store.top_by_score(limit).await?;

    // Dense ranks over the page: tied scores share the rank of the first
    // entry with that score, which equals 1 + the strictly-greater count.
    let mut entries = Vec::with_capacity(top.len());
    let mut rank = 0_i64;
    let mut last_score = None;
    for (i, p) in top.into_iter().enumerate() {
        if last_score != Some(p.high_score) {
            rank = i as i64 + 1;
            last_score = Some(p.high_score);
        }
        entries.push(LeaderboardEntry {
            user_id: p.user_id,
            username: None,
            high_score: p.high_score,
            rank,
        });
    }

    Ok(Json(entries))
}

// ---------------------------------------------------------------------------
// GET /api/leaderboard/{user_id}/rank
// ---------------------------------------------------------------------------

pub(crate) async fn user_rank(
    State(st): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<RankedScore>, ApiError> {
    Ok(Json(st.store.rank(&user_id).await?))
}

// ---------------------------------------------------------------------------
// POST /api/purchases/record
// ---------------------------------------------------------------------------

pub(crate) async fn record_purchase(
    State(st): State<Arc<AppState>>,
    Json(input): Json<PurchaseCreate>,
) -> Result<Json<PurchaseRecord>, ApiError> {
    let record = PurchaseRecord {
        id: Uuid::new_v4(),
        user_id: input.user_id,
        product_id: input.product_id,
        transaction_id: input.transaction_id,
        platform: input.platform,
        event_type: None,
        amount: input.amount,
        currency: input.currency,
        created_at: Utc::now(),
    };
    st.store.insert_purchase(&record).await?;

    info!(user_id = %record.user_id, product_id = %record.product_id, "purchases/record");
    Ok(Json(record))
}

// ---------------------------------------------------------------------------
// GET /api/purchases/{user_id}
// ---------------------------------------------------------------------------

pub(crate) async fn user_purchases(
    State(st): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<PurchaseRecord>>, ApiError> {
    Ok(Json(st.store.purchases_for_user(&user_id).await?))
}

// ---------------------------------------------------------------------------
// POST /api/webhook/revenuecat
// ---------------------------------------------------------------------------

/// Subscription-platform webhook.
///
/// Always answers `{"status":"ok"}`: a non-2xx here would put the payment
/// platform into a retry storm. Failures are logged and swallowed.
pub(crate) async fn revenuecat_webhook(
    State(st): State<Arc<AppState>>,
    Json(payload): Json<serde_json::Value>,
) -> Json<WebhookAck> {
    if let Err(err) = webhook::process(st.store.as_ref(), payload, Utc::now()).await {
        error!(error = %format!("{err:#}"), "revenuecat webhook failed");
    }
    Json(WebhookAck { status: "ok" })
}
