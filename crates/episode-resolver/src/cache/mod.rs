//! In-memory TTL cache.
//!
//! Entries expire lazily: an expired entry is dropped by the `get` that
//! observes it, or by an explicit [`TtlCache::cleanup_expired`] sweep. There is
//! no capacity bound. Writers racing on the same key resolve last-write-wins.

mod key;

pub use key::{Operation, generate_key};

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            ttl,
        }
    }

    /// Visible while `now - created_at <= ttl`.
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

/// Thread-safe key/value store with per-entry expiry.
///
/// Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct TtlCache<V> {
    entries: Arc<DashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Returns the cached value, or `None` if absent or expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;

        if entry.is_expired() {
            drop(entry); // Release the shard lock before removing
            self.entries.remove_if(key, |_, entry| entry.is_expired());
            return None;
        }

        Some(entry.value.clone())
    }

    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries.insert(key.into(), CacheEntry::new(value, ttl));
    }

    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before.saturating_sub(self.len())
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
