use std::collections::BTreeMap;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reef_db::{
    GameStore, HighScoreOutcome, RankedScore, StoreError, StoreResult, PURCHASE_LIST_LIMIT,
    STATUS_CHECK_LIST_LIMIT,
};
use reef_schemas::{PlayerProgress, PurchaseRecord, StatusCheck};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Inner {
    progress: BTreeMap<String, PlayerProgress>,
    purchases: Vec<PurchaseRecord>,
    status_checks: Vec<StatusCheck>,
}

/// In-memory [`GameStore`]. The narrow mutations delegate to the pure
/// reconcile-engine operations, so this store and the SQL implementation
/// cannot drift apart semantically.
#[derive(Debug, Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored progress records (assertion helper).
    pub async fn progress_count(&self) -> usize {
        self.inner.lock().await.progress.len()
    }
}

#[async_trait]
impl GameStore for MemStore {
    async fn get_progress(&self, user_id: &str) -> StoreResult<Option<PlayerProgress>> {
        Ok(self.inner.lock().await.progress.get(user_id).cloned())
    }

    async fn upsert_progress(&self, progress: &PlayerProgress) -> StoreResult<()> {
        let _ = self
            .inner
            .lock()
            .await
            .progress
            .insert(progress.user_id.clone(), progress.clone());
        Ok(())
    }

    async fn top_by_score(&self, limit: i64) -> StoreResult<Vec<PlayerProgress>> {
        let inner = self.inner.lock().await;
        let mut all: Vec<PlayerProgress> = inner.progress.values().cloned().collect();
        // Descending score; ties by insertion order (created_at, then user_id).
        all.sort_by(|a, b| {
            b.high_score
                .cmp(&a.high_score)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.user_id.cmp(&b.user_id))
        });
        all.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(all)
    }

    async fn rank(&self, user_id: &str) -> StoreResult<RankedScore> {
        let inner = self.inner.lock().await;
        let me = inner.progress.get(user_id).ok_or(StoreError::NotFound)?;
        let greater = inner
            .progress
            .values()
            .filter(|p| p.high_score > me.high_score)
            .count() as i64;
        Ok(RankedScore {
            user_id: me.user_id.clone(),
            high_score: me.high_score,
            rank: 1 + greater,
        })
    }

    async fn increment_coins(
        &self,
        user_id: &str,
        delta: i64,
        now: DateTime<Utc>,
    ) -> StoreResult<PlayerProgress> {
        let mut inner = self.inner.lock().await;
        let current = inner.progress.get(user_id).ok_or(StoreError::NotFound)?;
        let next = reef_reconcile::add_coins(current, delta, now);
        let _ = inner.progress.insert(user_id.to_string(), next.clone());
        Ok(next)
    }

    async fn set_high_score_if_greater(
        &self,
        user_id: &str,
        score: i64,
        now: DateTime<Utc>,
    ) -> StoreResult<HighScoreOutcome> {
        let mut inner = self.inner.lock().await;
        let current = inner.progress.get(user_id).ok_or(StoreError::NotFound)?;
        let previous = current.high_score;
        let (next, _) = reef_reconcile::submit_high_score(current, score, now);
        let _ = inner.progress.insert(user_id.to_string(), next.clone());
        Ok(HighScoreOutcome {
            progress: next,
            previous,
        })
    }

    async fn set_ads_removed(
        &self,
        user_id: &str,
        removed: bool,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(p) = inner.progress.get_mut(user_id) {
            p.ads_removed = removed;
            p.updated_at = now;
        }
        Ok(())
    }

    async fn insert_purchase(&self, purchase: &PurchaseRecord) -> StoreResult<()> {
        self.inner.lock().await.purchases.push(purchase.clone());
        Ok(())
    }

    async fn purchases_for_user(&self, user_id: &str) -> StoreResult<Vec<PurchaseRecord>> {
        let inner = self.inner.lock().await;
        let mut mine: Vec<PurchaseRecord> = inner
            .purchases
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        mine.truncate(PURCHASE_LIST_LIMIT as usize);
        Ok(mine)
    }

    async fn insert_status_check(&self, check: &StatusCheck) -> StoreResult<()> {
        self.inner.lock().await.status_checks.push(check.clone());
        Ok(())
    }

    async fn list_status_checks(&self) -> StoreResult<Vec<StatusCheck>> {
        let inner = self.inner.lock().await;
        let mut all = inner.status_checks.clone();
        all.truncate(STATUS_CHECK_LIST_LIMIT as usize);
        Ok(all)
    }
}

/// A store whose every operation fails with a backend error. Drives the
/// 500-path and webhook error-swallowing tests.
#[derive(Debug, Default)]
pub struct FailStore;

impl FailStore {
    pub fn new() -> Self {
        Self
    }
}

fn injected() -> StoreError {
    StoreError::Backend(anyhow!("injected store failure"))
}

#[async_trait]
impl GameStore for FailStore {
    async fn get_progress(&self, _user_id: &str) -> StoreResult<Option<PlayerProgress>> {
        Err(injected())
    }

    async fn upsert_progress(&self, _progress: &PlayerProgress) -> StoreResult<()> {
        Err(injected())
    }

    async fn top_by_score(&self, _limit: i64) -> StoreResult<Vec<PlayerProgress>> {
        Err(injected())
    }

    async fn rank(&self, _user_id: &str) -> StoreResult<RankedScore> {
        Err(injected())
    }

    async fn increment_coins(
        &self,
        _user_id: &str,
        _delta: i64,
        _now: DateTime<Utc>,
    ) -> StoreResult<PlayerProgress> {
        Err(injected())
    }

    async fn set_high_score_if_greater(
        &self,
        _user_id: &str,
        _score: i64,
        _now: DateTime<Utc>,
    ) -> StoreResult<HighScoreOutcome> {
        Err(injected())
    }

    async fn set_ads_removed(
        &self,
        _user_id: &str,
        _removed: bool,
        _now: DateTime<Utc>,
    ) -> StoreResult<()> {
        Err(injected())
    }

    async fn insert_purchase(&self, _purchase: &PurchaseRecord) -> StoreResult<()> {
        Err(injected())
    }

    async fn purchases_for_user(&self, _user_id: &str) -> StoreResult<Vec<PurchaseRecord>> {
        Err(injected())
    }

    async fn insert_status_check(&self, _check: &StatusCheck) -> StoreResult<()> {
        Err(injected())
    }

    async fn list_status_checks(&self) -> StoreResult<Vec<StatusCheck>> {
        Err(injected())
    }
}
