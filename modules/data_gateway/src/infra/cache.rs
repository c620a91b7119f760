//! Process-local TTL cache for single-record reads
//!
//! Cached objects have a single canonical shape, so projected reads bypass
//! this cache entirely in both directions. Mutations invalidate the whole
//! entity type: bulk predicates cannot be re-parsed per id after the fact,
//! and type-wide invalidation stays correct under concurrent same-type
//! writers. Expired entries are treated as absent and evicted on the next
//! access, not eagerly swept.

use dashmap::DashMap;
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct CacheKey {
    entity: String,
    id: String,
}

struct CacheEntry {
    record: Value,
    expires_at: Instant,
}

/// Keyed snapshot store for full-shape single-record reads
pub struct RecordCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
}

impl RecordCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Last-read snapshot for (entity, id), or absent when never cached or
    /// past its TTL
    pub fn get(&self, entity: &str, id: &str) -> Option<Value> {
        let key = CacheKey {
            entity: entity.to_string(),
            id: id.to_string(),
        };
        let expired = match self.entries.get(&key) {
            Some(entry) => {
                if entry.expires_at > Instant::now() {
                    return Some(entry.record.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            self.entries.remove(&key);
        }
        None
    }

    pub fn put(&self, entity: &str, id: &str, record: Value) {
        self.entries.insert(
            CacheKey {
                entity: entity.to_string(),
                id: id.to_string(),
            },
            CacheEntry {
                record,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Remove every entry for an entity type
    pub fn invalidate(&self, entity: &str) {
        self.entries.retain(|key, _| key.entity != entity);
        tracing::debug!(entity, "cache invalidated");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
