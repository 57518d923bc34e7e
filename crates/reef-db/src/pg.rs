//! PostgreSQL implementation of the [`GameStore`] contract.
//!
//! All queries are hand-bound `sqlx::query` calls decoded via `try_get`; the
//! two narrow mutations are single UPDATE statements so they are atomic at
//! the row level without any application locking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reef_schemas::{PlayerProgress, PurchaseRecord, StatusCheck};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{
    GameStore, HighScoreOutcome, RankedScore, StoreError, StoreResult, PURCHASE_LIST_LIMIT,
    STATUS_CHECK_LIST_LIMIT,
};

const PROGRESS_COLUMNS: &str = "user_id, high_score, coins, unlocked_skins, selected_skin, \
     owned_power_ups, ads_removed, total_games_played, total_coins_earned, \
     unlocked_achievements, achievement_stats, created_at, updated_at";

/// Store handle over a shared connection pool. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn progress_from_row(row: &PgRow) -> StoreResult<PlayerProgress> {
    let skins: Vec<String> = row.try_get("unlocked_skins")?;
    let achievements: Vec<String> = row.try_get("unlocked_achievements")?;
    let power_ups: Json<BTreeMap<String, i64>> = row.try_get("owned_power_ups")?;
    let stats: Json<BTreeMap<String, i64>> = row.try_get("achievement_stats")?;

    Ok(PlayerProgress {
        user_id: row.try_get("user_id")?,
        high_score: row.try_get("high_score")?,
        coins: row.try_get("coins")?,
        unlocked_skins: skins.into_iter().collect(),
        selected_skin: row.try_get("selected_skin")?,
        owned_power_ups: power_ups.0,
        ads_removed: row.try_get("ads_removed")?,
        total_games_played: row.try_get("total_games_played")?,
        total_coins_earned: row.try_get("total_coins_earned")?,
        unlocked_achievements: achievements.into_iter().collect(),
        achievement_stats: stats.0,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn purchase_from_row(row: &PgRow) -> StoreResult<PurchaseRecord> {
    Ok(PurchaseRecord {
        id: row.try_get::<Uuid, _>("id")?,
        user_id: row.try_get("user_id")?,
        product_id: row.try_get("product_id")?,
        transaction_id: row.try_get("transaction_id")?,
        platform: row.try_get("platform")?,
        event_type: row.try_get("event_type")?,
        amount: row.try_get("amount")?,
        currency: row.try_get("currency")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl GameStore for PgStore {
    async fn get_progress(&self, user_id: &str) -> StoreResult<Option<PlayerProgress>> {
        let row = sqlx::query(&format!(
            "select {PROGRESS_COLUMNS} from player_progress where user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(progress_from_row).transpose()
    }

    async fn upsert_progress(&self, progress: &PlayerProgress) -> StoreResult<()> {
        let skins: Vec<String> = progress.unlocked_skins.iter().cloned().collect();
        let achievements: Vec<String> = progress.unlocked_achievements.iter().cloned().collect();

        sqlx::query(
            r#"
            insert into player_progress (
              user_id, high_score, coins, unlocked_skins, selected_skin,
              owned_power_ups, ads_removed, total_games_played,
              total_coins_earned, unlocked_achievements, achievement_stats,
              created_at, updated_at
            ) values (
              $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13
            )
            on conflict (user_id) do update set
              high_score            = excluded.high_score,
              coins                 = excluded.coins,
              unlocked_skins        = excluded.unlocked_skins,
              selected_skin         = excluded.selected_skin,
              owned_power_ups       = excluded.owned_power_ups,
              ads_removed           = excluded.ads_removed,
              total_games_played    = excluded.total_games_played,
              total_coins_earned    = excluded.total_coins_earned,
              unlocked_achievements = excluded.unlocked_achievements,
              achievement_stats     = excluded.achievement_stats,
              updated_at            = excluded.updated_at
            "#,
        )
        .bind(&progress.user_id)
        .bind(progress.high_score)
        .bind(progress.coins)
        .bind(&skins)
        .bind(&progress.selected_skin)
        .bind(Json(&progress.owned_power_ups))
        .bind(progress.ads_removed)
        .bind(progress.total_games_played)
        .bind(progress.total_coins_earned)
        .bind(&achievements)
        .bind(Json(&progress.achievement_stats))
        .bind(progress.created_at)
        .bind(progress.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn top_by_score(&self, limit: i64) -> StoreResult<Vec<PlayerProgress>> {
        let rows = sqlx::query(&format!(
            "select {PROGRESS_COLUMNS} from player_progress \
             order by high_score desc, created_at asc, user_id asc limit $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(progress_from_row).collect()
    }

    async fn rank(&self, user_id: &str) -> StoreResult<RankedScore> {
        let row = sqlx::query(
            r#"
            select p.user_id,
                   p.high_score,
                   1 + (select count(*) from player_progress q
                        where q.high_score > p.high_score) as rank
            from player_progress p
            where p.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(RankedScore {
            user_id: row.try_get("user_id")?,
            high_score: row.try_get("high_score")?,
            rank: row.try_get("rank")?,
        })
    }

    async fn increment_coins(
        &self,
        user_id: &str,
        delta: i64,
        now: DateTime<Utc>,
    ) -> StoreResult<PlayerProgress> {
        let row = sqlx::query(&format!(
            "update player_progress \
             set coins = coins + $2, \
                 total_coins_earned = total_coins_earned + $2, \
                 updated_at = $3 \
             where user_id = $1 \
             returning {PROGRESS_COLUMNS}"
        ))
        .bind(user_id)
        .bind(delta)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        progress_from_row(&row)
    }

    async fn set_high_score_if_greater(
        &self,
        user_id: &str,
        score: i64,
        now: DateTime<Utc>,
    ) -> StoreResult<HighScoreOutcome> {
        // The CTE captures the pre-update score so one statement yields both
        // the new record and whether the submission improved on it.
        let row = sqlx::query(
            r#"
            with prev as (
              select high_score from player_progress where user_id = $1
            )
            update player_progress p
            set high_score = greatest(p.high_score, $2),
                updated_at = $3
            from prev
            where p.user_id = $1
            returning p.user_id, p.high_score, p.coins, p.unlocked_skins,
                      p.selected_skin, p.owned_power_ups, p.ads_removed,
                      p.total_games_played, p.total_coins_earned,
                      p.unlocked_achievements, p.achievement_stats,
                      p.created_at, p.updated_at,
                      prev.high_score as previous_high_score
            "#,
        )
        .bind(user_id)
        .bind(score)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        let previous: i64 = row.try_get("previous_high_score")?;
        Ok(HighScoreOutcome {
            progress: progress_from_row(&row)?,
            previous,
        })
    }

    async fn set_ads_removed(
        &self,
        user_id: &str,
        removed: bool,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        // Zero matched rows is fine here: entitlement events for players who
        // never synced are dropped, matching webhook semantics.
        let _ = sqlx::query(
            "update player_progress set ads_removed = $2, updated_at = $3 where user_id = $1",
        )
        .bind(user_id)
        .bind(removed)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_purchase(&self, purchase: &PurchaseRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            insert into purchases (
              id, user_id, product_id, transaction_id, platform, event_type,
              amount, currency, created_at
            ) values (
              $1, $2, $3, $4, $5, $6, $7, $8, $9
            )
            "#,
        )
        .bind(purchase.id)
        .bind(&purchase.user_id)
        .bind(&purchase.product_id)
        .bind(&purchase.transaction_id)
        .bind(&purchase.platform)
        .bind(&purchase.event_type)
        .bind(purchase.amount)
        .bind(&purchase.currency)
        .bind(purchase.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn purchases_for_user(&self, user_id: &str) -> StoreResult<Vec<PurchaseRecord>> {
        let rows = sqlx::query(
            "select id, user_id, product_id, transaction_id, platform, event_type, \
                    amount, currency, created_at \
             from purchases where user_id = $1 \
             order by created_at desc limit $2",
        )
        .bind(user_id)
        .bind(PURCHASE_LIST_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(purchase_from_row).collect()
    }

    async fn insert_status_check(&self, check: &StatusCheck) -> StoreResult<()> {
        sqlx::query("insert into status_checks (id, client_name, ts_utc) values ($1, $2, $3)")
            .bind(check.id)
            .bind(&check.client_name)
            .bind(check.ts_utc)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_status_checks(&self) -> StoreResult<Vec<StatusCheck>> {
        let rows = sqlx::query(
            "select id, client_name, ts_utc from status_checks order by ts_utc asc limit $1",
        )
        .bind(STATUS_CHECK_LIST_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(StatusCheck {
                    id: row.try_get::<Uuid, _>("id")?,
                    client_name: row.try_get("client_name")?,
                    ts_utc: row.try_get("ts_utc")?,
                })
            })
            .collect()
    }
}
