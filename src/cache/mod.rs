//! In-memory cache with a time-to-live
//!
//! Loaded collections are stored under a string key and reused until the
//! entry is older than the cache's TTL. Failed fetches are never stored.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    stored_at: Instant,
}

impl Entry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// Keyed cache of shared values
pub struct TtlCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value stored under `key`, if it holds a `T`
    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<T>> {
        let entries = self.lock();
        let entry = entries.get(key).filter(|e| e.is_fresh(self.ttl))?;
        Arc::clone(&entry.value).downcast::<T>().ok()
    }

    pub fn insert<T: Send + Sync + 'static>(&self, key: &str, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.lock().insert(
            key.to_string(),
            Entry {
                value: value.clone(),
                stored_at: Instant::now(),
            },
        );
        value
    }

    /// Return the cached value for `key`, or run `fetch` and store its result.
    ///
    /// The lock is not held while `fetch` runs, so two callers missing at the
    /// same time may both fetch; the later result wins.
    pub fn get_or_fetch<T, E, F>(&self, key: &str, fetch: F) -> Result<Arc<T>, E>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(value) = self.get::<T>(key) {
            tracing::trace!("Cache hit: {}", key);
            return Ok(value);
        }
        tracing::debug!("Cache miss: {}", key);
        let value = fetch()?;
        Ok(self.insert(key, value))
    }

    pub fn invalidate(&self, key: &str) {
        self.lock().remove(key);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries, including expired ones not yet replaced
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
