use chrono::{DateTime, Utc};
use reef_schemas::{PlayerProgress, ProgressSnapshot, DEFAULT_SKIN};

/// Combine a client-submitted snapshot with the stored record (if any) into
/// the new canonical record.
///
/// With no stored record the snapshot is taken verbatim and
/// `created_at == updated_at == now` — this is the only path that
/// establishes identity for a player. With a stored record each field is
/// combined per its merge class:
///
/// - `high_score`, `total_games_played`, `total_coins_earned`: max
/// - `unlocked_skins`, `unlocked_achievements`: set union
/// - `coins`, `selected_skin`, `owned_power_ups`: incoming wins
/// - `ads_removed`: logical OR (sticky true)
/// - `achievement_stats`: shallow merge, incoming overwrites per key
/// - `created_at`: carried over; `updated_at`: always `now`
///
/// Total over structurally valid input: out-of-range values (negative
/// counters, unknown skin ids) pass through unclamped. The default skin is
/// inserted on both paths so no merge can evict it.
pub fn merge(
    existing: Option<&PlayerProgress>,
    incoming: ProgressSnapshot,
    now: DateTime<Utc>,
) -> PlayerProgress {
    let Some(prev) = existing else {
        return first_sync(incoming, now);
    };

    let mut unlocked_skins = prev.unlocked_skins.clone();
    unlocked_skins.extend(incoming.unlocked_skins);
    unlocked_skins.insert(DEFAULT_SKIN.to_string());

    let mut unlocked_achievements = prev.unlocked_achievements.clone();
    unlocked_achievements.extend(incoming.unlocked_achievements);

    let mut achievement_stats = prev.achievement_stats.clone();
    achievement_stats.extend(incoming.achievement_stats);

    PlayerProgress {
        user_id: incoming.user_id,
        high_score: prev.high_score.max(incoming.high_score),
        coins: incoming.coins,
        unlocked_skins,
        selected_skin: incoming.selected_skin,
        owned_power_ups: incoming.owned_power_ups,
        ads_removed: prev.ads_removed || incoming.ads_removed,
        total_games_played: prev.total_games_played.max(incoming.total_games_played),
        total_coins_earned: prev.total_coins_earned.max(incoming.total_coins_earned),
        unlocked_achievements,
        achievement_stats,
        created_at: prev.created_at,
        updated_at: now,
    }
}

fn first_sync(incoming: ProgressSnapshot, now: DateTime<Utc>) -> PlayerProgress {
    let mut unlocked_skins = incoming.unlocked_skins;
    unlocked_skins.insert(DEFAULT_SKIN.to_string());

    PlayerProgress {
        user_id: incoming.user_id,
        high_score: incoming.high_score,
        coins: incoming.coins,
        unlocked_skins,
        selected_skin: incoming.selected_skin,
        owned_power_ups: incoming.owned_power_ups,
        ads_removed: incoming.ads_removed,
        total_games_played: incoming.total_games_played,
        total_coins_earned: incoming.total_coins_earned,
        unlocked_achievements: incoming.unlocked_achievements,
        achievement_stats: incoming.achievement_stats,
        created_at: now,
        updated_at: now,
    }
}

/// Add `amount` to both `coins` and `total_coins_earned`.
///
/// `amount` may be negative (refunds); the balance is intentionally not
/// clamped to non-negative.
pub fn add_coins(existing: &PlayerProgress, amount: i64, now: DateTime<Utc>) -> PlayerProgress {
    let mut next = existing.clone();
    next.coins += amount;
    next.total_coins_earned += amount;
    next.updated_at = now;
    next
}

/// Raise `high_score` to `score` if it is an improvement.
///
/// Returns the updated record and whether `score` strictly exceeded the
/// previous value.
pub fn submit_high_score(
    existing: &PlayerProgress,
    score: i64,
    now: DateTime<Utc>,
) -> (PlayerProgress, bool) {
    let is_new_record = score > existing.high_score;
    let mut next = existing.clone();
    next.high_score = next.high_score.max(score);
    next.updated_at = now;
    (next, is_new_record)
}
