//! Bounded TTL cache mapping re-issued token ids to original tokens.

use dashmap::DashMap;
use jiff::{SignedDuration, Timestamp};

#[derive(Debug, Clone)]
struct CacheEntry {
    token: String,
    expires_at: Timestamp,
}

/// Concurrent key-value cache keyed by the re-issued token's `jti`.
///
/// Writes to distinct keys do not contend. A read for an absent or expired
/// key is `None`, never an error. Entries have no ordering guarantee.
#[derive(Debug)]
pub struct TokenCache {
    entries: DashMap<String, CacheEntry>,
    capacity: usize,
    ttl: SignedDuration,
}

impl TokenCache {
    #[must_use]
    pub fn new(capacity: usize, ttl: SignedDuration) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
            ttl,
        }
    }

    /// Store `token` under `key`, evicting expired entries when at capacity.
    pub fn insert(&self, key: impl Into<String>, token: impl Into<String>) {
        if self.entries.len() >= self.capacity {
            let now = Timestamp::now();

            self.entries.retain(|_, entry| entry.expires_at > now);

            // Still full after the sweep: drop one arbitrary entry. The
            // cache is a convenience index, not a durability guarantee.
            if self.entries.len() >= self.capacity {
                // Bind the key first so the iterator's shard guard is
                // released before `remove` takes the write lock.
                let victim = self
                    .entries
                    .iter()
                    .next()
                    .map(|entry| entry.key().clone());

                if let Some(key) = victim {
                    self.entries.remove(&key);
                }
            }
        }

        // An extreme TTL saturates instead of overflowing.
        let expires_at = Timestamp::now()
            .checked_add(self.ttl)
            .unwrap_or(Timestamp::MAX);

        self.entries.insert(
            key.into(),
            CacheEntry {
                token: token.into(),
                expires_at,
            },
        );
    }

    /// The cached token for `key`, or `None` when absent or expired.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > Timestamp::now() => {
                return Some(entry.token.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }

        None
    }
}
