// Transient state cache - recent-message history per (guild, user).
//
// Feeds the flood and duplicate-message checks. Entries are pruned to the
// retention window on every access and by a periodic full sweep; an entry
// that prunes to empty is removed entirely, so idle users cost nothing.

use super::protection_models::MessageEvent;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Default retention: one hour, matching the background sweep interval.
pub const DEFAULT_RETENTION_SECS: i64 = 60 * 60;

/// One remembered message.
#[derive(Debug, Clone)]
pub struct MessageSnapshot {
    pub message_id: u64,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

type CacheKey = (u64, u64);

/// Process-wide recent-message history.
pub struct TransientStateCache {
    entries: DashMap<CacheKey, Vec<MessageSnapshot>>,
    retention: Duration,
}

impl Default for TransientStateCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TransientStateCache {
    pub fn new() -> Self {
        Self::with_retention_secs(DEFAULT_RETENTION_SECS)
    }

    pub fn with_retention_secs(retention_secs: i64) -> Self {
        Self {
            entries: DashMap::new(),
            retention: Duration::seconds(retention_secs),
        }
    }

    /// Append one message to the author's history, pruning stale entries
    /// while we hold the slot.
    pub fn record(&self, event: &MessageEvent) {
        let cutoff = event.timestamp - self.retention;
        let mut entry = self
            .entries
            .entry((event.guild_id, event.author_id))
            .or_default();
        entry.retain(|m| m.timestamp >= cutoff);
        entry.push(MessageSnapshot {
            message_id: event.message_id,
            content: event.content.clone(),
            timestamp: event.timestamp,
        });
    }

    /// Messages from the user inside the given window, oldest first.
    /// Also prunes anything past the retention cutoff; an entry that
    /// empties out is dropped on this access.
    pub fn recent(
        &self,
        guild_id: u64,
        user_id: u64,
        window_secs: u64,
        now: DateTime<Utc>,
    ) -> Vec<MessageSnapshot> {
        let key = (guild_id, user_id);
        let retention_cutoff = now - self.retention;
        let window_cutoff = now - Duration::seconds(window_secs as i64);

        let result = match self.entries.get_mut(&key) {
            Some(mut entry) => {
                entry.retain(|m| m.timestamp >= retention_cutoff);
                entry
                    .iter()
                    .filter(|m| m.timestamp >= window_cutoff)
                    .cloned()
                    .collect()
            }
            None => Vec::new(),
        };

        // Guard dropped above; safe to remove the slot if it emptied out.
        self.entries.remove_if(&key, |_, v| v.is_empty());
        result
    }

    /// How many of the user's last `history` messages inside the window
    /// carry exactly this content, excluding the message itself.
    pub fn duplicate_count(
        &self,
        guild_id: u64,
        user_id: u64,
        content: &str,
        window_secs: u64,
        history: usize,
        exclude_message_id: u64,
        now: DateTime<Utc>,
    ) -> usize {
        let recent = self.recent(guild_id, user_id, window_secs, now);
        recent
            .iter()
            .rev()
            .take(history)
            .filter(|m| m.message_id != exclude_message_id && m.content == content)
            .count()
    }

    /// Full sweep: drop stale snapshots everywhere and evict entries that
    /// end up empty. Returns the number of entries evicted.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.retention;
        for mut entry in self.entries.iter_mut() {
            entry.value_mut().retain(|m| m.timestamp >= cutoff);
        }
        let before = self.entries.len();
        self.entries.retain(|_, v| !v.is_empty());
        before - self.entries.len()
    }

    /// Whether the user currently has a cache entry (used by tests and the
    /// sweep log line).
    pub fn contains(&self, guild_id: u64, user_id: u64) -> bool {
        self.entries.contains_key(&(guild_id, user_id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
