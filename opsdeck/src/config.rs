//! Toolkit-wide configuration.
//!
//! Every section defaults independently, so a file only needs the knobs it
//! changes:
//!
//! ```json
//! { "batch": { "concurrency": 4 }, "chunks": { "chunk_size": 50 } }
//! ```

use opsdeck_batch::BatchConfig;
use opsdeck_chunks::ChunkConfig;
use opsdeck_preload::{PredictiveConfig, PreloadConfig, RenderCacheConfig};
use opsdeck_reorder::ReorderConfig;
use opsdeck_shortcuts::RouterConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value {value:?} for {name}")]
    InvalidEnv { name: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    pub batch: BatchConfig,
    pub chunks: ChunkConfig,
    pub preload: PreloadConfig,
    pub predictive: PredictiveConfig,
    pub render_cache: RenderCacheConfig,
    pub reorder: ReorderConfig,
    pub shortcuts: RouterConfig,
}

fn parse<T: FromStr>(name: &str, value: String) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { name: name.to_string(), value })
}

impl ToolkitConfig {
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded toolkit config from {}", path.display());
        Self::from_json_str(&raw)
    }

    /// Defaults with `OPSDECK_*` environment overrides applied.
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value.
    ///
    /// Recognised names:
    /// `OPSDECK_BATCH_CONCURRENCY`, `OPSDECK_BATCH_RETRY_COUNT`,
    /// `OPSDECK_BATCH_TIMEOUT_MS`, `OPSDECK_CHUNK_SIZE`,
    /// `OPSDECK_CHUNK_CACHE_SIZE`, `OPSDECK_PRELOAD_ENABLED`,
    /// `OPSDECK_PRELOAD_DELAY_MS`, `OPSDECK_PRELOAD_TTL_MS`,
    /// `OPSDECK_SHORTCUTS_ENABLED`.
    ///
    /// Nothing is changed if any value fails to parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut next = self.clone();
        let get = |name: &str| lookup(name).map(|value| (name.to_string(), value));

        if let Some((name, value)) = get("OPSDECK_BATCH_CONCURRENCY") {
            next.batch.concurrency = parse(&name, value)?;
        }
        if let Some((name, value)) = get("OPSDECK_BATCH_RETRY_COUNT") {
            next.batch.retry_count = parse(&name, value)?;
        }
        if let Some((name, value)) = get("OPSDECK_BATCH_TIMEOUT_MS") {
            next.batch.timeout_ms = Some(parse(&name, value)?);
        }
        if let Some((name, value)) = get("OPSDECK_CHUNK_SIZE") {
            next.chunks.chunk_size = parse(&name, value)?;
        }
        if let Some((name, value)) = get("OPSDECK_CHUNK_CACHE_SIZE") {
            next.chunks.cache_size = parse(&name, value)?;
        }
        if let Some((name, value)) = get("OPSDECK_PRELOAD_ENABLED") {
            next.preload.enabled = parse(&name, value)?;
        }
        if let Some((name, value)) = get("OPSDECK_PRELOAD_DELAY_MS") {
            next.preload.prefetch_delay_ms = parse(&name, value)?;
        }
        if let Some((name, value)) = get("OPSDECK_PRELOAD_TTL_MS") {
            next.preload.cache_ttl_ms = parse(&name, value)?;
        }
        if let Some((name, value)) = get("OPSDECK_SHORTCUTS_ENABLED") {
            next.shortcuts.enabled = parse(&name, value)?;
        }

        *self = next;
        Ok(())
    }
}
