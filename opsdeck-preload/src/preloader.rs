//! Keyed preload cache with lazy TTL expiry.

use crate::error::{PreloadError, PreloadResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Preloader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreloadConfig {
    /// When false every preload is a no-op returning `None`.
    pub enabled: bool,
    /// Wait before a non-immediate load (ms).
    pub prefetch_delay_ms: u64,
    /// Age after which a cached entry is treated as absent (ms).
    pub cache_ttl_ms: u64,
    /// Upper bound on keys taken by `prefetch_multiple`.
    pub prefetch_limit: Option<usize>,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefetch_delay_ms: 100,
            cache_ttl_ms: 60_000,
            prefetch_limit: None,
        }
    }
}

impl PreloadConfig {
    pub fn prefetch_delay(&self) -> Duration {
        Duration::from_millis(self.prefetch_delay_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}

/// A cached value and when it was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub key: String,
    pub value: T,
    pub created_at: Instant,
}

impl<T> CacheEntry<T> {
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

struct State<T> {
    cache: HashMap<String, CacheEntry<T>>,
    in_flight: HashSet<String>,
    timers: HashMap<String, (u64, JoinHandle<()>)>,
    next_ticket: u64,
}

impl<T> State<T> {
    /// Returns the entry if it is still fresh, dropping it otherwise.
    fn fresh(&mut self, key: &str, ttl: Duration) -> Option<&CacheEntry<T>> {
        let expired = self.cache.get(key)?.age() > ttl;
        if expired {
            debug!("Cache entry for {} expired", key);
            self.cache.remove(key);
            return None;
        }
        self.cache.get(key)
    }
}

struct Inner<T> {
    config: PreloadConfig,
    state: Mutex<State<T>>,
}

/// TTL-bounded key/value cache filled by caller-supplied load functions.
///
/// Cloning is cheap and shares the cache.
pub struct DataPreloader<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for DataPreloader<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for DataPreloader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataPreloader")
            .field("config", &self.inner.config)
            .field("cache_size", &self.cache_size())
            .finish()
    }
}

impl<T> Default for DataPreloader<T> {
    fn default() -> Self {
        Self::new(PreloadConfig::default())
    }
}

/// Clears the in-flight mark when a preload finishes or is dropped.
struct InFlight<'a, T> {
    preloader: &'a DataPreloader<T>,
    key: &'a str,
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        self.preloader.state().in_flight.remove(self.key);
    }
}

impl<T> DataPreloader<T> {
    pub fn new(config: PreloadConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(State {
                    cache: HashMap::new(),
                    in_flight: HashSet::new(),
                    timers: HashMap::new(),
                    next_ticket: 0,
                }),
            }),
        }
    }

    pub fn config(&self) -> &PreloadConfig {
        &self.inner.config
    }

    fn state(&self) -> MutexGuard<'_, State<T>> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes one key, or every key when `key` is `None`.
    pub fn clear(&self, key: Option<&str>) {
        let mut state = self.state();
        match key {
            Some(key) => {
                state.cache.remove(key);
            }
            None => state.cache.clear(),
        }
    }

    /// Number of stored entries, expired ones included until they are read.
    pub fn cache_size(&self) -> usize {
        self.state().cache.len()
    }

    /// Stored keys in lexical order.
    pub fn cache_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.state().cache.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// True while a load for `key` is running.
    pub fn is_loading(&self, key: &str) -> bool {
        self.state().in_flight.contains(key)
    }

    /// Number of delayed prefetches still waiting to fire.
    pub fn scheduled_prefetches(&self) -> usize {
        self.state().timers.len()
    }

    /// Aborts the delayed prefetch for `key`. Returns whether one was pending.
    pub fn cancel_prefetch(&self, key: &str) -> bool {
        match self.state().timers.remove(key) {
            Some((_, handle)) => {
                debug!("Cancelled prefetch for {}", key);
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Aborts every delayed prefetch.
    pub fn cancel_all_prefetches(&self) {
        let mut state = self.state();
        for (key, (_, handle)) in state.timers.drain() {
            debug!("Cancelled prefetch for {}", key);
            handle.abort();
        }
    }

    /// Cancels pending prefetches and empties the cache.
    pub fn cleanup(&self) {
        self.cancel_all_prefetches();
        self.clear(None);
    }
}

impl<T: Clone> DataPreloader<T> {
    /// Returns a fresh entry. Expired entries are removed and reported absent.
    pub fn get(&self, key: &str) -> Option<CacheEntry<T>> {
        self.state()
            .fresh(key, self.inner.config.cache_ttl())
            .cloned()
    }

    /// Returns the cached value for `key`, or loads it.
    ///
    /// Without `immediate` the load waits `prefetch_delay` first. A load
    /// that raises or yields `None` caches nothing. While a load for `key`
    /// is running, further calls return `None` without loading.
    pub async fn preload<F, Fut>(&self, key: &str, load: F, immediate: bool) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Option<T>>>,
    {
        if !self.inner.config.enabled {
            debug!("Preloader disabled, skipping {}", key);
            return None;
        }

        {
            let mut state = self.state();
            if let Some(entry) = state.fresh(key, self.inner.config.cache_ttl()) {
                debug!("Cache hit for {}", key);
                return Some(entry.value.clone());
            }
            if !state.in_flight.insert(key.to_string()) {
                debug!("Preload for {} already in flight", key);
                return None;
            }
        }
        let _in_flight = InFlight {
            preloader: self,
            key,
        };

        let delay = self.inner.config.prefetch_delay();
        if !immediate && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match load().await {
            Ok(Some(value)) => {
                debug!("Preloaded {}", key);
                self.state().cache.insert(
                    key.to_string(),
                    CacheEntry {
                        key: key.to_string(),
                        value: value.clone(),
                        created_at: Instant::now(),
                    },
                );
                Some(value)
            }
            Ok(None) => {
                debug!("Load for {} yielded nothing", key);
                None
            }
            Err(e) => {
                warn!("Failed to load key {}: {}", key, e);
                None
            }
        }
    }

    /// Preloads each key in turn, never two at once.
    ///
    /// Only the first `prefetch_limit` keys are taken when a limit is set.
    pub async fn prefetch_multiple<I, S, F, Fut>(&self, keys: I, load: F, immediate: bool)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> Fut,
        Fut: Future<Output = anyhow::Result<Option<T>>>,
    {
        if !self.inner.config.enabled {
            return;
        }

        let limit = self.inner.config.prefetch_limit.unwrap_or(usize::MAX);
        for key in keys.into_iter().take(limit) {
            let key = key.as_ref();
            self.preload(key, || load(key), immediate).await;
        }
    }
}

impl<T: Clone + Send + 'static> DataPreloader<T> {
    /// Schedules an immediate preload of `key` after `delay` on the current
    /// tokio runtime. At most one delayed prefetch per key is pending.
    pub fn prefetch_with_delay<F, Fut>(&self, key: &str, load: F, delay: Duration) -> PreloadResult<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<Option<T>>> + Send + 'static,
    {
        if !self.inner.config.enabled {
            return Err(PreloadError::Disabled);
        }
        let runtime = Handle::try_current().map_err(|_| PreloadError::NoRuntime)?;

        let mut state = self.state();
        if state.timers.contains_key(key) {
            return Err(PreloadError::AlreadyScheduled(key.to_string()));
        }
        let ticket = state.next_ticket;
        state.next_ticket += 1;

        let preloader = self.clone();
        let owned_key = key.to_string();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            preloader.preload(&owned_key, load, true).await;

            let mut state = preloader.state();
            if matches!(state.timers.get(&owned_key), Some((t, _)) if *t == ticket) {
                state.timers.remove(&owned_key);
            }
        });

        debug!("Scheduled prefetch for {} in {:?}", key, delay);
        state.timers.insert(key.to_string(), (ticket, handle));
        Ok(())
    }
}
