//! Checkoff toggling — the mark-done / unmark protocol.
//!
//! A toggle looks up the checkoff for the chore's current period (today
//! for daily chores, this week for weekly ones). If one exists it is
//! deleted and the reward for the period is revoked; otherwise a new
//! checkoff is inserted and a reward granted.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::calendar;
use crate::chores::model::{Checkoff, Chore, ChoreKind};
use crate::chores::rewards::RewardLedger;
use crate::error::DatabaseError;
use crate::store::Database;

/// Result of a toggle, serialized straight into the HTTP response.
#[derive(Debug, Clone, Serialize)]
pub struct ToggleOutcome {
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<String>,
}

/// The period window a checkoff for this chore kind lives in.
pub fn period_window(kind: ChoreKind, now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    match kind {
        ChoreKind::Daily => (calendar::start_of_day(now), calendar::end_of_day(now)),
        ChoreKind::Weekly => (calendar::start_of_week(now), calendar::end_of_week(now)),
    }
}

/// The reward ledger key for this chore kind's current period.
pub fn period_key(kind: ChoreKind, now: NaiveDateTime) -> String {
    match kind {
        ChoreKind::Daily => calendar::day_key(now),
        ChoreKind::Weekly => calendar::week_key(now),
    }
}

/// Toggle a chore's checkoff for the period containing `now`.
///
/// The ledger is only touched after the store call succeeds, so a
/// failed delete or insert leaves the reward state unchanged.
/// Concurrent toggles must not interleave; the HTTP layer serializes
/// calls with a lock.
pub async fn toggle_chore(
    db: &dyn Database,
    rewards: &RewardLedger,
    chore: &Chore,
    now: NaiveDateTime,
) -> Result<ToggleOutcome, DatabaseError> {
    let (from, to) = period_window(chore.kind, now);
    let period = period_key(chore.kind, now);

    match db.find_checkoff_in_range(chore.id, from, to).await? {
        Some(existing) => {
            db.delete_checkoff(existing.id).await?;
            rewards.revoke(chore.id, &period).await;
            Ok(ToggleOutcome {
                done: false,
                reward: None,
            })
        }
        None => {
            let checkoff = Checkoff::new(chore.id, now);
            db.insert_checkoff(&checkoff).await?;
            let reward = rewards.grant(chore.id, &period).await;
            Ok(ToggleOutcome {
                done: true,
                reward: Some(reward),
            })
        }
    }
}
