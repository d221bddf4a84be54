//! Process-wide key/value cache with per-entry expiry.
//!
//! Stale entries never leave `get`: expiry is checked on every read and the
//! stale entry is dropped right there. Keys that are written once and never
//! read again are reclaimed by [`TtlCache::cleanup`], which
//! [`TtlCache::spawn_sweeper`] runs on a fixed interval.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::{task::JoinHandle, time::Duration};
use tracing::debug;

use crate::models::cache::CacheEntry;

pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Overwrites whatever is stored under `key`. Last write wins.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries.insert(key.into(), CacheEntry::new(value, ttl));
    }

    pub fn get(&self, key: &str) -> Option<V> {
        {
            let entry = self.entries.get(key)?;
            if !entry.is_expired() {
                return Some(entry.value.clone());
            }
        }
        // The shard guard is released above. Re-check under the write lock so a
        // fresh value stored by a concurrent request is left alone.
        if self
            .entries
            .remove_if(key, |_, entry| entry.is_expired())
            .is_some()
        {
            debug!("Evicted stale cache entry {}", key);
        }
        None
    }

    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored entries, including stale ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    /// Runs `cleanup` every `interval` until the runtime shuts down.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = cache.cleanup();
                if purged > 0 {
                    debug!("Cache sweep purged {} expired entries", purged);
                }
            }
        })
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
