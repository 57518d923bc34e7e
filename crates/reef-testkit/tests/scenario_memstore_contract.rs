//! Scenario: the in-memory store honors the same contract the SQL store is
//! tested against — dense ranking consistent with the leaderboard ordering,
//! NotFound for unknown players, newest-first purchase listing.

use chrono::{Duration, TimeZone, Utc};
use reef_db::{GameStore, StoreError};
use reef_reconcile::merge;
use reef_schemas::{ProgressSnapshot, PurchaseRecord};
use reef_testkit::MemStore;
use uuid::Uuid;

#[tokio::test]
async fn rank_is_dense_and_matches_top_by_score() -> anyhow::Result<()> {
    let store = MemStore::new();
    let base = Utc.with_ymd_and_hms(2025, 10, 5, 9, 0, 0).unwrap();

    for (i, (user_id, score)) in [("ann", 50), ("bob", 50), ("cleo", 80), ("dia", 10)]
        .into_iter()
        .enumerate()
    {
        let mut snap = ProgressSnapshot::new(user_id);
        snap.high_score = score;
        let record = merge(None, snap, base + Duration::seconds(i as i64));
        store.upsert_progress(&record).await?;
    }

    assert_eq!(store.progress_count().await, 4);
    assert_eq!(store.rank("cleo").await?.rank, 1);
    assert_eq!(store.rank("ann").await?.rank, 2);
    assert_eq!(store.rank("bob").await?.rank, 2);
    assert_eq!(store.rank("dia").await?.rank, 4);

    let order: Vec<String> = store
        .top_by_score(10)
        .await?
        .into_iter()
        .map(|p| p.user_id)
        .collect();
    assert_eq!(order, vec!["cleo", "ann", "bob", "dia"]);

    Ok(())
}

#[tokio::test]
async fn narrow_ops_mirror_engine_semantics() -> anyhow::Result<()> {
    let store = MemStore::new();
    let t0 = Utc.with_ymd_and_hms(2025, 10, 6, 9, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2025, 10, 6, 9, 1, 0).unwrap();

    let mut snap = ProgressSnapshot::new("player-1");
    snap.coins = 100;
    snap.total_coins_earned = 200;
    snap.high_score = 100;
    store.upsert_progress(&merge(None, snap, t0)).await?;

    let credited = store.increment_coins("player-1", 50, t1).await?;
    assert_eq!(credited.coins, 150);
    assert_eq!(credited.total_coins_earned, 250);

    let worse = store.set_high_score_if_greater("player-1", 80, t1).await?;
    assert!(!worse.is_new_record());
    assert_eq!(worse.progress.high_score, 100);

    let better = store.set_high_score_if_greater("player-1", 150, t1).await?;
    assert!(better.is_new_record());
    assert_eq!(better.progress.high_score, 150);

    assert!(matches!(
        store.increment_coins("ghost", 10, t1).await,
        Err(StoreError::NotFound)
    ));
    assert!(matches!(store.rank("ghost").await, Err(StoreError::NotFound)));

    Ok(())
}

#[tokio::test]
async fn purchases_list_newest_first() -> anyhow::Result<()> {
    let store = MemStore::new();
    let base = Utc.with_ymd_and_hms(2025, 10, 7, 9, 0, 0).unwrap();

    for (product, offset_min) in [("coins_100", 0), ("coins_500", 5)] {
        store
            .insert_purchase(&PurchaseRecord {
                id: Uuid::new_v4(),
                user_id: "buyer".to_string(),
                product_id: product.to_string(),
                transaction_id: format!("txn-{product}"),
                platform: "ios".to_string(),
                event_type: None,
                amount: None,
                currency: None,
                created_at: base + Duration::minutes(offset_min),
            })
            .await?;
    }

    let listed = store.purchases_for_user("buyer").await?;
    assert_eq!(listed[0].product_id, "coins_500");
    assert_eq!(listed[1].product_id, "coins_100");

    Ok(())
}
