//! Scenario: re-applying the same snapshot against the merge's own output is
//! a no-op for every field except `updated_at`.

use chrono::{TimeZone, Utc};
use reef_reconcile::merge;
use reef_schemas::ProgressSnapshot;

#[test]
fn reapplying_same_snapshot_changes_only_updated_at() {
    let t0 = Utc.with_ymd_and_hms(2025, 7, 1, 10, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2025, 7, 1, 10, 5, 0).unwrap();

    let mut snap = ProgressSnapshot::new("player-1");
    snap.high_score = 88;
    snap.coins = 120;
    snap.unlocked_skins.insert("puffer".to_string());
    snap.selected_skin = "puffer".to_string();
    snap.owned_power_ups.insert("magnet".to_string(), 1);
    snap.ads_removed = true;
    snap.total_games_played = 19;
    snap.total_coins_earned = 450;
    snap.unlocked_achievements.insert("deep_diver".to_string());
    snap.achievement_stats.insert("bubbles_popped".to_string(), 200);

    let first = merge(None, snap.clone(), t0);
    let second = merge(Some(&first), snap, t1);

    let mut expected = first.clone();
    expected.updated_at = t1;
    assert_eq!(second, expected);
}
