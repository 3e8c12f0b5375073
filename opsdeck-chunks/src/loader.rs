//! Chunk table with shared in-flight loads.
//!
//! Each chunk is addressed by an id whose trailing number is its index. A
//! chunk is absent, loading (one shared future every caller awaits), or
//! loaded. Loads are finalized by whichever waiter observes the result first;
//! a generation number keeps a load detached by [`ChunkedDataLoader::clear`]
//! or an eviction from writing back into the table.

use crate::error::{ChunkError, ChunkResult};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Loader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Records per chunk.
    pub chunk_size: usize,
    /// Chunks fetched by [`ChunkedDataLoader::preload_chunks`].
    pub preload_count: usize,
    /// Chunks retained by [`ChunkedDataLoader::cleanup_cache`]. Loads never
    /// evict on their own; the table grows until `cleanup_cache` runs.
    pub cache_size: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 20,
            preload_count: 2,
            cache_size: 5,
        }
    }
}

/// Whether a resident chunk has its data yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkState {
    Loading,
    Loaded,
}

/// Snapshot of a resident chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk<T> {
    pub id: String,
    pub index: usize,
    /// `None` while loading.
    pub data: Option<Arc<Vec<T>>>,
    pub state: ChunkState,
}

impl<T> Chunk<T> {
    pub fn is_loaded(&self) -> bool {
        self.state == ChunkState::Loaded
    }

    pub fn is_loading(&self) -> bool {
        self.state == ChunkState::Loading
    }
}

type SharedLoad<T> = Shared<BoxFuture<'static, ChunkResult<Arc<Vec<T>>>>>;

enum Slot<T> {
    Loading {
        load: SharedLoad<T>,
        generation: u64,
    },
    Loaded(Arc<Vec<T>>),
}

struct Entry<T> {
    index: usize,
    slot: Slot<T>,
}

impl<T> Entry<T> {
    fn resident(&self) -> Resident<T> {
        match &self.slot {
            Slot::Loaded(data) => Resident::Ready(Arc::clone(data)),
            Slot::Loading { load, generation } => Resident::Pending(load.clone(), *generation),
        }
    }

    fn snapshot(&self, id: &str) -> Chunk<T> {
        let (data, state) = match &self.slot {
            Slot::Loading { .. } => (None, ChunkState::Loading),
            Slot::Loaded(data) => (Some(Arc::clone(data)), ChunkState::Loaded),
        };
        Chunk {
            id: id.to_string(),
            index: self.index,
            data,
            state,
        }
    }
}

struct Table<T> {
    entries: HashMap<String, Entry<T>>,
    next_generation: u64,
}

enum Resident<T> {
    Ready(Arc<Vec<T>>),
    Pending(SharedLoad<T>, u64),
}

struct Inner<T> {
    config: ChunkConfig,
    table: Mutex<Table<T>>,
}

/// Paginated loader that caches fixed-size chunks of a larger dataset.
///
/// Cloning is cheap and shares the chunk table.
pub struct ChunkedDataLoader<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ChunkedDataLoader<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for ChunkedDataLoader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkedDataLoader")
            .field("config", &self.inner.config)
            .field("resident", &self.len())
            .finish()
    }
}

impl<T> Default for ChunkedDataLoader<T> {
    fn default() -> Self {
        Self::new(ChunkConfig::default())
    }
}

impl<T> ChunkedDataLoader<T> {
    /// Creates an empty loader. A zero `chunk_size` is treated as 1.
    pub fn new(mut config: ChunkConfig) -> Self {
        config.chunk_size = config.chunk_size.max(1);
        Self {
            inner: Arc::new(Inner {
                config,
                table: Mutex::new(Table {
                    entries: HashMap::new(),
                    next_generation: 0,
                }),
            }),
        }
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.inner.config
    }

    fn table(&self) -> MutexGuard<'_, Table<T>> {
        self.inner.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Extracts the trailing number of a chunk id.
    ///
    /// `"chunk-5"`, `"custom-5"` and `"5"` all name chunk 5. Ids without
    /// trailing digits (or whose number overflows) yield `None`.
    pub fn chunk_index(chunk_id: &str) -> Option<usize> {
        let prefix = chunk_id.trim_end_matches(|c: char| c.is_ascii_digit());
        let digits = &chunk_id[prefix.len()..];
        if digits.is_empty() {
            return None;
        }
        digits.parse().ok()
    }

    /// Id of the chunk holding the record at `item_index`.
    pub fn chunk_id(&self, item_index: usize) -> String {
        format!("chunk-{}", item_index / self.inner.config.chunk_size)
    }

    /// Returns a snapshot of one resident chunk.
    pub fn get_chunk(&self, chunk_id: &str) -> Option<Chunk<T>> {
        self.table()
            .entries
            .get(chunk_id)
            .map(|entry| entry.snapshot(chunk_id))
    }

    fn collect_where(&self, keep: impl Fn(&Entry<T>) -> bool) -> Vec<Chunk<T>> {
        let table = self.table();
        let mut chunks: Vec<Chunk<T>> = table
            .entries
            .iter()
            .filter(|(_, entry)| keep(entry))
            .map(|(id, entry)| entry.snapshot(id))
            .collect();
        chunks.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.id.cmp(&b.id)));
        chunks
    }

    /// All resident chunks, ordered by index.
    pub fn get_all_chunks(&self) -> Vec<Chunk<T>> {
        self.collect_where(|_| true)
    }

    /// Resident chunks that finished loading, ordered by index.
    pub fn get_loaded_chunks(&self) -> Vec<Chunk<T>> {
        self.collect_where(|entry| matches!(entry.slot, Slot::Loaded(_)))
    }

    /// Chunks with a load in flight, ordered by index.
    pub fn get_loading_chunks(&self) -> Vec<Chunk<T>> {
        self.collect_where(|entry| matches!(entry.slot, Slot::Loading { .. }))
    }

    /// Resident `chunk-<n>` chunks covering records `start_item..=end_item`.
    pub fn get_chunks_in_range(&self, start_item: usize, end_item: usize) -> Vec<Chunk<T>> {
        let size = self.inner.config.chunk_size;
        let table = self.table();
        (start_item / size..=end_item / size)
            .filter_map(|index| {
                let id = format!("chunk-{index}");
                table.entries.get(&id).map(|entry| entry.snapshot(&id))
            })
            .collect()
    }

    /// Number of resident chunks, loading or loaded.
    pub fn len(&self) -> usize {
        self.table().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evicts the lowest-indexed chunks until at most `cache_size` remain.
    pub fn cleanup_cache(&self) {
        let cache_size = self.inner.config.cache_size;
        let mut table = self.table();
        if table.entries.len() <= cache_size {
            return;
        }

        let mut resident: Vec<(usize, String)> = table
            .entries
            .iter()
            .map(|(id, entry)| (entry.index, id.clone()))
            .collect();
        resident.sort_by(|a, b| b.cmp(a));

        for (index, id) in resident.into_iter().skip(cache_size) {
            debug!("Evicting chunk {} (index {})", id, index);
            table.entries.remove(&id);
        }
    }

    /// Evicts every chunk. In-flight loads still resolve for their callers
    /// but no longer populate the table.
    pub fn clear(&self) {
        let mut table = self.table();
        debug!("Clearing {} chunks", table.entries.len());
        table.entries.clear();
    }

    fn lookup(&self, chunk_id: &str) -> Option<Resident<T>> {
        self.table()
            .entries
            .get(chunk_id)
            .map(|entry| entry.resident())
    }

    fn finish(&self, chunk_id: &str, generation: u64, outcome: &ChunkResult<Arc<Vec<T>>>) {
        let mut table = self.table();
        let current = matches!(
            table.entries.get(chunk_id).map(|entry| &entry.slot),
            Some(Slot::Loading { generation: g, .. }) if *g == generation
        );
        if !current {
            return;
        }

        match outcome {
            Ok(data) => {
                if let Some(entry) = table.entries.get_mut(chunk_id) {
                    debug!("Chunk {} loaded ({} records)", chunk_id, data.len());
                    entry.slot = Slot::Loaded(Arc::clone(data));
                }
            }
            Err(e) => {
                warn!("Chunk {} failed to load: {}", chunk_id, e);
                table.entries.remove(chunk_id);
            }
        }
    }
}

impl<T: Send + Sync + 'static> ChunkedDataLoader<T> {
    /// Loads a chunk through `fetch(offset, limit)`, or returns the cached data.
    ///
    /// Concurrent calls for the same chunk share one fetch. A failed fetch
    /// fails every waiter and leaves the chunk absent.
    pub async fn load_chunk<F, Fut>(&self, chunk_id: &str, fetch: F) -> ChunkResult<Arc<Vec<T>>>
    where
        F: FnOnce(usize, usize) -> Fut,
        Fut: Future<Output = anyhow::Result<Vec<T>>> + Send + 'static,
    {
        let index = Self::chunk_index(chunk_id)
            .ok_or_else(|| ChunkError::InvalidChunkId(chunk_id.to_string()))?;

        let resident = match self.lookup(chunk_id) {
            Some(resident) => {
                debug!("Chunk {} resident, reusing", chunk_id);
                resident
            }
            None => {
                let limit = self.inner.config.chunk_size;
                let offset = index
                    .checked_mul(limit)
                    .ok_or_else(|| ChunkError::InvalidChunkId(chunk_id.to_string()))?;
                // Built outside the lock so `fetch` may call back into the loader.
                let pending = fetch(offset, limit);
                self.register(chunk_id, index, pending)
            }
        };

        let (load, generation) = match resident {
            Resident::Ready(data) => return Ok(data),
            Resident::Pending(load, generation) => (load, generation),
        };

        let outcome = load.await;
        self.finish(chunk_id, generation, &outcome);
        outcome
    }

    fn register<Fut>(&self, chunk_id: &str, index: usize, pending: Fut) -> Resident<T>
    where
        Fut: Future<Output = anyhow::Result<Vec<T>>> + Send + 'static,
    {
        let mut table = self.table();
        if let Some(entry) = table.entries.get(chunk_id) {
            // Another caller got here between the lookup and the lock.
            return entry.resident();
        }

        let generation = table.next_generation;
        table.next_generation += 1;

        let load = async move {
            pending
                .await
                .map(Arc::new)
                .map_err(|e| ChunkError::Fetch(e.to_string()))
        }
        .boxed()
        .shared();

        debug!("Loading chunk {} (index {})", chunk_id, index);
        table.entries.insert(
            chunk_id.to_string(),
            Entry {
                index,
                slot: Slot::Loading {
                    load: load.clone(),
                    generation,
                },
            },
        );
        Resident::Pending(load, generation)
    }

    /// Loads `preload_count` chunks starting at chunk `start_chunk`, one after
    /// another in ascending order. Loaded chunks are skipped and failures are
    /// logged, never returned.
    pub async fn preload_chunks<F, Fut>(&self, start_chunk: usize, fetch: F)
    where
        F: Fn(usize, usize) -> Fut,
        Fut: Future<Output = anyhow::Result<Vec<T>>> + Send + 'static,
    {
        let count = self.inner.config.preload_count;
        for index in start_chunk..start_chunk.saturating_add(count) {
            let chunk_id = format!("chunk-{index}");
            if matches!(self.lookup(&chunk_id), Some(Resident::Ready(_))) {
                continue;
            }
            if let Err(e) = self.load_chunk(&chunk_id, &fetch).await {
                warn!("Preload of {} failed: {}", chunk_id, e);
            }
        }
    }
}
