//! reef-reconcile
//!
//! Game-state reconciliation engine.
//!
//! Architectural decisions:
//! - Per-field merge policy: counters take max, collections take union,
//!   client-authoritative fields take last-write-wins
//! - `ads_removed` is sticky true (reversed only by an explicit refund event,
//!   which bypasses the merge)
//! - First sync for a user id establishes the record; later syncs only merge
//! - Re-applying the same snapshot changes nothing but `updated_at`
//!
//! Deterministic, pure logic. No IO. No store calls — `now` is a parameter.

mod engine;

pub use engine::{add_coins, merge, submit_high_score};
