//! In-memory TTL cache with least-recently-used eviction

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Clock;

/// A cached value plus its bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub access_count: u64,
}

impl<V> CacheEntry<V> {
    pub fn new(key: impl Into<String>, value: V, now: DateTime<Utc>, ttl: Duration) -> Self {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            key: key.into(),
            value,
            created_at: now,
            expires_at,
            last_accessed_at: now,
            access_count: 0,
        }
    }

    /// Expired strictly after `expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Outcome of a cache read
#[derive(Debug, PartialEq)]
pub enum Lookup<V> {
    Hit(V),
    /// Entry was present but stale; it has been removed
    Expired,
    Miss,
}

struct Slot<V> {
    entry: CacheEntry<V>,
    /// Insertion order, breaks `last_accessed_at` ties on eviction
    seq: u64,
}

/// Bounded map with per-entry TTL and LRU eviction.
///
/// Not synchronized; wrap it in a mutex to share it.
pub struct LruTtlCache<V> {
    entries: HashMap<String, Slot<V>>,
    capacity: usize,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
    next_seq: u64,
}

impl<V: Clone> LruTtlCache<V> {
    pub fn new(capacity: usize, default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            default_ttl,
            clock,
            next_seq: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Read a value; stale entries are dropped and hits update access stats.
    pub fn lookup(&mut self, key: &str) -> Lookup<V> {
        let now = self.clock.now();
        let Some(slot) = self.entries.get_mut(key) else {
            return Lookup::Miss;
        };

        if slot.entry.is_expired_at(now) {
            self.entries.remove(key);
            return Lookup::Expired;
        }

        slot.entry.last_accessed_at = now;
        slot.entry.access_count += 1;
        Lookup::Hit(slot.entry.value.clone())
    }

    /// Entry metadata without touching access stats
    pub fn entry(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key).map(|slot| &slot.entry)
    }

    pub fn set_with_ttl(&mut self, key: &str, value: V, ttl: Duration) -> Option<CacheEntry<V>> {
        let entry = CacheEntry::new(key, value, self.clock.now(), ttl);
        self.insert_entry(entry)
    }

    /// Insert a prepared entry (e.g. promoted from durable storage).
    ///
    /// Overwriting an existing key never evicts; a new key at capacity
    /// evicts exactly one least-recently-accessed entry first.
    pub fn insert_entry(&mut self, entry: CacheEntry<V>) -> Option<CacheEntry<V>> {
        let evicted = if !self.entries.contains_key(&entry.key)
            && self.entries.len() >= self.capacity
        {
            self.evict_lru()
        } else {
            None
        };

        self.next_seq += 1;
        self.entries.insert(
            entry.key.clone(),
            Slot {
                entry,
                seq: self.next_seq,
            },
        );
        evicted
    }

    fn evict_lru(&mut self) -> Option<CacheEntry<V>> {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, slot)| (slot.entry.last_accessed_at, slot.seq))
            .map(|(key, _)| key.clone())?;
        self.entries.remove(&victim).map(|slot| slot.entry)
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn sweep_expired(&mut self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, slot| !slot.entry.is_expired_at(now));
        before - self.entries.len()
    }
}

#[cfg(test)]
impl<V: Clone> LruTtlCache<V> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&mut self, key: &str) -> Option<V> {
        match self.lookup(key) {
            Lookup::Hit(value) => Some(value),
            Lookup::Expired | Lookup::Miss => None,
        }
    }

    /// Insert with the default TTL. Returns the evicted entry, if any.
    pub fn set(&mut self, key: &str, value: V) -> Option<CacheEntry<V>> {
        self.set_with_ttl(key, value, self.default_ttl)
    }

    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
