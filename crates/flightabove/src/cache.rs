//! A small time-to-live cache.
//!
//! [`TtlCache`] stores values with their insertion time and answers lookups
//! according to a fixed TTL. Expired entries are not evicted on read, so a
//! caller that prefers stale data over nothing can still reach them through
//! [`TtlCache::get_stale`]. Every insert drops the entries that have expired,
//! which keeps caches keyed by an open-ended set (callsigns) bounded by what
//! was seen within one TTL.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> Entry<V> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() < ttl
    }
}

/// Thread-safe key/value cache with a single TTL for all entries.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Get a value if it is younger than the TTL.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries
            .lock()
            .get(key)
            .filter(|entry| entry.is_fresh(self.ttl))
            .map(|entry| entry.value.clone())
    }

    /// Get a value regardless of its age.
    #[must_use]
    pub fn get_stale(&self, key: &K) -> Option<V> {
        self.entries.lock().get(key).map(|entry| entry.value.clone())
    }

    /// Age of the entry stored under `key`, if any.
    #[must_use]
    pub fn age(&self, key: &K) -> Option<Duration> {
        self.entries
            .lock()
            .get(key)
            .map(|entry| entry.inserted_at.elapsed())
    }

    /// Insert or replace a value, resetting its age.
    ///
    /// Expired entries under other keys are dropped first.
    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| entry.is_fresh(self.ttl));
        entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Number of stored entries, fresh or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Return the fresh value for `key`, or compute, store and return a new one.
    ///
    /// The lock is not held while `compute` runs, so concurrent callers for
    /// the same key may both compute; the last one to finish wins. A failed
    /// computation leaves the cache untouched.
    ///
    /// # Errors
    ///
    /// Returns whatever error `compute` returns.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let value = compute().await?;
        self.insert(key, value.clone());
        Ok(value)
    }
}
