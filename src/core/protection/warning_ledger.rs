// Warning ledger - per (guild, user, category) offense counters.
//
// Counts only increase unless explicitly reset by an administrative
// operation. Unlike the transient message cache, ledger entries never
// expire on their own: a second offense a week later is still a second
// offense.

use super::protection_models::RuleCategory;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// One offense counter with last-triggered metadata.
#[derive(Debug, Clone)]
pub struct WarningRecord {
    pub count: u32,
    pub last_triggered: DateTime<Utc>,
}

type LedgerKey = (u64, u64, RuleCategory);

/// Process-wide offense counters.
///
/// DashMap gives us synchronized accessors without a big lock, so two
/// concurrent evaluations for the same user cannot lose an update.
#[derive(Default)]
pub struct WarningLedger {
    records: DashMap<LedgerKey, WarningRecord>,
}

impl WarningLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one offense and return the new total for that category.
    pub fn record(&self, guild_id: u64, user_id: u64, category: RuleCategory) -> u32 {
        let mut entry = self
            .records
            .entry((guild_id, user_id, category))
            .or_insert(WarningRecord {
                count: 0,
                last_triggered: Utc::now(),
            });
        entry.count += 1;
        entry.last_triggered = Utc::now();
        entry.count
    }

    /// How many times this user has triggered this category so far.
    pub fn count(&self, guild_id: u64, user_id: u64, category: RuleCategory) -> u32 {
        self.records
            .get(&(guild_id, user_id, category))
            .map(|r| r.count)
            .unwrap_or(0)
    }

    /// Administrative reset. With a category, clears only that counter;
    /// without, clears every counter the user has in the guild. Returns the
    /// number of counters removed.
    pub fn reset(&self, guild_id: u64, user_id: u64, category: Option<RuleCategory>) -> usize {
        match category {
            Some(cat) => {
                if self.records.remove(&(guild_id, user_id, cat)).is_some() {
                    1
                } else {
                    0
                }
            }
            None => {
                let keys: Vec<LedgerKey> = self
                    .records
                    .iter()
                    .map(|e| *e.key())
                    .filter(|(g, u, _)| *g == guild_id && *u == user_id)
                    .collect();
                let mut removed = 0;
                for key in keys {
                    if self.records.remove(&key).is_some() {
                        removed += 1;
                    }
                }
                removed
            }
        }
    }
}
