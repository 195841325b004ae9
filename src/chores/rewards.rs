//! Reward ledger — remembers which celebratory emoji a completion earned.
//!
//! Rewards are presentation-only and live in process memory, keyed by
//! (chore, period). Re-rendering the same period shows the same emoji
//! instead of re-rolling; unmarking a chore forgets it. A restart forgets
//! everything, which only costs a fresh roll.

use std::collections::HashMap;
use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Emoji a completion can earn.
const REWARD_POOL: &[&str] = &[
    "🎉", "⭐", "🌟", "🌈", "🦄", "🎈", "🏅", "💖", "🍭", "✨",
];

/// In-memory reward store keyed by (chore, period key).
///
/// Period keys come from `calendar::day_key` for daily chores and
/// `calendar::week_key` for weekly ones.
pub struct RewardLedger {
    rewards: RwLock<HashMap<(Uuid, String), String>>,
}

impl RewardLedger {
    /// Create an empty ledger.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rewards: RwLock::new(HashMap::new()),
        })
    }

    /// Return the reward for this (chore, period), rolling one the first time.
    pub async fn grant(&self, chore_id: Uuid, period_key: &str) -> String {
        let key = (chore_id, period_key.to_string());
        let mut rewards = self.rewards.write().await;
        if let Some(existing) = rewards.get(&key) {
            return existing.clone();
        }

        let emoji = REWARD_POOL
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("🎉")
            .to_string();
        debug!(chore_id = %chore_id, period = %period_key, reward = %emoji, "Reward granted");
        rewards.insert(key, emoji.clone());
        emoji
    }

    /// Forget the reward for this (chore, period). Used on unmark.
    pub async fn revoke(&self, chore_id: Uuid, period_key: &str) {
        let key = (chore_id, period_key.to_string());
        self.rewards.write().await.remove(&key);
    }

    /// Look up the reward for this (chore, period) without rolling one.
    pub async fn get(&self, chore_id: Uuid, period_key: &str) -> Option<String> {
        let key = (chore_id, period_key.to_string());
        self.rewards.read().await.get(&key).cloned()
    }

    /// Drop entries whose period key is no longer live. Returns the number
    /// of entries removed. Called from the periodic sweep task.
    pub async fn prune(&self, live_keys: &[String]) -> usize {
        let mut rewards = self.rewards.write().await;
        let before = rewards.len();
        rewards.retain(|(_, period), _| live_keys.iter().any(|k| k == period));
        before - rewards.len()
    }

    /// Number of remembered rewards.
    pub async fn len(&self) -> usize {
        self.rewards.read().await.len()
    }

    /// Check if the ledger is empty.
    pub async fn is_empty(&self) -> bool {
        self.rewards.read().await.is_empty()
    }
}
