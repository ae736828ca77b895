//! Two-tier result cache
//!
//! Memory first, then the durable SQLite tier. Durable-tier failures are
//! logged and treated as misses; no operation here returns an error.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;

use super::{CacheEntry, CacheStorage, Clock, Lookup, LruTtlCache};

pub struct ResultCache<V> {
    memory: Mutex<LruTtlCache<V>>,
    durable: Option<Mutex<CacheStorage>>,
    /// When false, reads always miss and writes are dropped
    enabled: bool,
}

impl<V> ResultCache<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + 'static,
{
    pub fn new(memory: LruTtlCache<V>, durable: Option<CacheStorage>) -> Self {
        Self {
            memory: Mutex::new(memory),
            durable: durable.map(Mutex::new),
            enabled: true,
        }
    }

    /// Turn the cache into a pass-through (`--no-cache`, `cache.enabled: false`).
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn memory(&self) -> MutexGuard<'_, LruTtlCache<V>> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the durable tier, if there is one and it is usable.
    fn with_durable<T>(
        &self,
        action: &str,
        f: impl FnOnce(&CacheStorage) -> Result<T, crate::error::CacheError>,
    ) -> Option<T> {
        let durable = self.durable.as_ref()?;
        let guard = match durable.lock() {
            Ok(guard) => guard,
            Err(_) => {
                log::warn!("Durable cache lock poisoned, skipping {}", action);
                return None;
            }
        };
        match f(&guard) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Durable cache {} failed: {}", action, e);
                None
            }
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.memory().default_ttl()
    }

    /// Look up a value, falling back to the durable tier on a memory miss.
    pub fn get(&self, key: &str) -> Option<V> {
        if !self.enabled {
            return None;
        }
        let (lookup, now) = {
            let mut memory = self.memory();
            (memory.lookup(key), memory.now())
        };

        match lookup {
            Lookup::Hit(value) => {
                log::debug!("Cache hit (memory): {}", key);
                Some(value)
            }
            Lookup::Expired => {
                log::debug!("Cache entry expired: {}", key);
                self.with_durable("delete", |store| store.delete(key));
                None
            }
            Lookup::Miss => {
                let mut entry: CacheEntry<V> = self
                    .with_durable("read", |store| store.get(key, now))
                    .flatten()?;
                log::debug!("Cache hit (durable): {}", key);

                entry.last_accessed_at = now;
                entry.access_count += 1;
                let value = entry.value.clone();
                let evicted = self.memory().insert_entry(entry);
                self.forget_evicted(evicted);
                self.with_durable("touch", |store| store.touch(key, now));
                Some(value)
            }
        }
    }

    /// Entry metadata from the memory tier without touching access stats
    pub fn entry(&self, key: &str) -> Option<CacheEntry<V>> {
        self.memory().entry(key).cloned()
    }

    pub fn set(&self, key: &str, value: V) {
        let ttl = self.default_ttl();
        self.set_with_ttl(key, value, ttl);
    }

    pub fn set_with_ttl(&self, key: &str, value: V, ttl: Duration) {
        if !self.enabled {
            return;
        }
        let (evicted, entry, capacity) = {
            let mut memory = self.memory();
            let evicted = memory.set_with_ttl(key, value, ttl);
            (evicted, memory.entry(key).cloned(), memory.capacity())
        };
        self.forget_evicted(evicted);

        let Some(entry) = entry else {
            return;
        };
        // Each run starts with an empty memory tier, so the durable tier is
        // bounded here rather than by memory evictions.
        self.with_durable("write", |store| {
            store.put(&entry)?;
            let expired = store.purge_expired(entry.created_at)?;
            let trimmed = store.trim_to(capacity)?;
            if expired + trimmed > 0 {
                log::debug!(
                    "Durable cache dropped {} expired and {} least recently used entries",
                    expired,
                    trimmed
                );
            }
            Ok(())
        });
    }

    fn forget_evicted(&self, evicted: Option<CacheEntry<V>>) {
        if let Some(evicted) = evicted {
            log::debug!("Cache evicted: {}", evicted.key);
            self.with_durable("delete", |store| store.delete(&evicted.key));
        }
    }

    /// Drop expired entries from both tiers. Returns the memory-tier count.
    pub fn sweep_expired(&self) -> usize {
        let (removed, now) = {
            let mut memory = self.memory();
            (memory.sweep_expired(), memory.now())
        };
        self.with_durable("purge", |store| store.purge_expired(now));
        removed
    }

    /// Sweep expired entries on a fixed interval until the cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let removed = cache.sweep_expired();
                if removed > 0 {
                    log::debug!("Swept {} expired cache entries", removed);
                }
            }
        })
    }
}

#[cfg(test)]
impl<V> ResultCache<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + 'static,
{
    /// Memory-only cache on the system clock
    pub fn in_memory(capacity: usize, ttl: Duration) -> Self {
        Self::new(
            LruTtlCache::new(capacity, ttl, Arc::new(super::SystemClock)),
            None,
        )
    }

    pub fn has_durable_tier(&self) -> bool {
        self.durable.is_some()
    }

    pub fn delete(&self, key: &str) -> bool {
        let in_memory = self.memory().delete(key);
        let in_durable = self
            .with_durable("delete", |store| store.delete(key))
            .unwrap_or(false);
        in_memory || in_durable
    }

    pub fn clear(&self) {
        self.memory().clear();
        self.with_durable("clear", |store| store.clear_all());
    }

    /// Number of entries in the memory tier
    pub fn len(&self) -> usize {
        self.memory().len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory().is_empty()
    }
}

/// Build a result cache on the given clock, with or without a durable tier.
pub fn build<V>(
    capacity: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    durable: Option<CacheStorage>,
) -> ResultCache<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + 'static,
{
    ResultCache::new(LruTtlCache::new(capacity, ttl, clock), durable)
}
