//! Scenario: the two narrow mutations — additive coin grant and conditional
//! high-score submission.

use chrono::{TimeZone, Utc};
use reef_reconcile::{add_coins, merge, submit_high_score};
use reef_schemas::ProgressSnapshot;

#[test]
fn add_coins_credits_both_counters() {
    let t0 = Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2025, 9, 1, 12, 1, 0).unwrap();

    let mut snap = ProgressSnapshot::new("player-1");
    snap.coins = 100;
    snap.total_coins_earned = 200;
    let stored = merge(None, snap, t0);

    let credited = add_coins(&stored, 50, t1);
    assert_eq!(credited.coins, 150);
    assert_eq!(credited.total_coins_earned, 250);
    assert_eq!(credited.updated_at, t1);
}

#[test]
fn add_coins_negative_refund_is_not_clamped() {
    let t0 = Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2025, 9, 1, 12, 1, 0).unwrap();

    let mut snap = ProgressSnapshot::new("player-2");
    snap.coins = 30;
    snap.total_coins_earned = 30;
    let stored = merge(None, snap, t0);

    let refunded = add_coins(&stored, -100, t1);
    assert_eq!(refunded.coins, -70, "balance may go negative by policy");
    assert_eq!(refunded.total_coins_earned, -70);
}

#[test]
fn submit_high_score_keeps_better_existing_score() {
    let t0 = Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2025, 9, 1, 12, 1, 0).unwrap();

    let mut snap = ProgressSnapshot::new("player-3");
    snap.high_score = 100;
    let stored = merge(None, snap, t0);

    let (kept, is_new_record) = submit_high_score(&stored, 80, t1);
    assert_eq!(kept.high_score, 100);
    assert!(!is_new_record);
}

#[test]
fn submit_high_score_accepts_improvement() {
    let t0 = Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2025, 9, 1, 12, 1, 0).unwrap();

    let mut snap = ProgressSnapshot::new("player-4");
    snap.high_score = 100;
    let stored = merge(None, snap, t0);

    let (raised, is_new_record) = submit_high_score(&stored, 150, t1);
    assert_eq!(raised.high_score, 150);
    assert!(is_new_record);
}

#[test]
fn submit_equal_score_is_not_a_new_record() {
    let t0 = Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2025, 9, 1, 12, 1, 0).unwrap();

    let mut snap = ProgressSnapshot::new("player-5");
    snap.high_score = 100;
    let stored = merge(None, snap, t0);

    let (kept, is_new_record) = submit_high_score(&stored, 100, t1);
    assert_eq!(kept.high_score, 100);
    assert!(!is_new_record, "a tie does not strictly exceed");
}
