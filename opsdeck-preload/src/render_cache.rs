//! Size- and age-bounded cache for rendered fragments.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderCacheConfig {
    /// Entries held before the oldest is evicted. Zero is treated as 1.
    pub max_size: usize,
    /// Age after which an entry is dropped (ms).
    pub ttl_ms: u64,
}

impl Default for RenderCacheConfig {
    fn default() -> Self {
        Self {
            max_size: 100,
            ttl_ms: 60_000,
        }
    }
}

/// Holds up to `max_size` values for at most `ttl_ms` each.
///
/// Inserting a new key into a full cache evicts the entry stored earliest.
#[derive(Debug)]
pub struct RenderCache<T> {
    entries: HashMap<String, (T, Instant)>,
    max_size: usize,
    ttl: Duration,
}

impl<T> Default for RenderCache<T> {
    fn default() -> Self {
        Self::new(RenderCacheConfig::default())
    }
}

impl<T> RenderCache<T> {
    pub fn new(config: RenderCacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            max_size: config.max_size.max(1),
            ttl: Duration::from_millis(config.ttl_ms),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: T) {
        let key = key.into();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
            self.evict_oldest();
        }
        self.entries.insert(key, (value, Instant::now()));
    }

    /// Returns a live entry; an expired one is removed on the way.
    pub fn get(&mut self, key: &str) -> Option<&T> {
        let expired = self.entries.get(key)?.1.elapsed() > self.ttl;
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|(value, _)| value)
    }

    pub fn has(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drops every expired entry and returns how many went.
    pub fn cleanup(&mut self) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, (_, stored)| stored.elapsed() <= ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, (_, stored))| *stored)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            debug!("Render cache full, evicting {}", key);
            self.entries.remove(&key);
        }
    }
}
