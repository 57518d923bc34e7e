//! Scenario: the first sync for a user id stores the snapshot verbatim and
//! stamps `created_at == updated_at`.

use chrono::{TimeZone, Utc};
use reef_reconcile::merge;
use reef_schemas::ProgressSnapshot;

#[test]
fn first_sync_takes_snapshot_verbatim() {
    let now = Utc.with_ymd_and_hms(2025, 5, 20, 18, 30, 0).unwrap();

    let mut snap = ProgressSnapshot::new("player-1");
    snap.high_score = 42;
    snap.coins = 310;
    snap.unlocked_skins.insert("shark".to_string());
    snap.selected_skin = "shark".to_string();
    snap.owned_power_ups.insert("shield".to_string(), 2);
    snap.total_games_played = 7;
    snap.total_coins_earned = 310;
    snap.unlocked_achievements.insert("first_flight".to_string());
    snap.achievement_stats.insert("games_won".to_string(), 3);

    let stored = merge(None, snap.clone(), now);

    assert_eq!(stored.user_id, snap.user_id);
    assert_eq!(stored.high_score, snap.high_score);
    assert_eq!(stored.coins, snap.coins);
    assert_eq!(stored.unlocked_skins, snap.unlocked_skins);
    assert_eq!(stored.selected_skin, snap.selected_skin);
    assert_eq!(stored.owned_power_ups, snap.owned_power_ups);
    assert_eq!(stored.ads_removed, snap.ads_removed);
    assert_eq!(stored.total_games_played, snap.total_games_played);
    assert_eq!(stored.total_coins_earned, snap.total_coins_earned);
    assert_eq!(stored.unlocked_achievements, snap.unlocked_achievements);
    assert_eq!(stored.achievement_stats, snap.achievement_stats);
    assert_eq!(stored.created_at, now);
    assert_eq!(stored.updated_at, now);
}
