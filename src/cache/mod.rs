//! Result caching
//!
//! An in-memory TTL/LRU map is the primary tier; an optional SQLite store
//! keeps results between runs. Keys are normalized locations.

pub mod key;
pub mod layered;
pub mod memory;
pub mod storage;

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Default time-to-live for a cached result
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60); // 10 min

/// Default number of results held in memory
pub const DEFAULT_CAPACITY: usize = 50;

/// Time source for expiry and access bookkeeping
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[cfg(test)]
pub struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

#[cfg(test)]
impl Default for ManualClock {
    fn default() -> Self {
        Self {
            now: std::sync::Mutex::new(Utc::now()),
        }
    }
}

#[cfg(test)]
impl ManualClock {
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(by).unwrap();
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// Re-export main types
pub use key::normalize_key;
pub use layered::ResultCache;
pub use memory::{CacheEntry, Lookup, LruTtlCache};
pub use storage::CacheStorage;
