//! Access-pattern prediction on top of [`DataPreloader`].
//!
//! Every lookup is recorded in a bounded FIFO history. Keys seen at least
//! `prediction_threshold` times within that history become prefetch
//! candidates, most frequent first and most recent on ties.

use crate::preloader::DataPreloader;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use tokio::time::Instant;
use tracing::debug;

/// Predictor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictiveConfig {
    pub enabled: bool,
    /// Oldest records are dropped beyond this many.
    pub max_history_size: usize,
    /// Minimum frequency before a key is predicted.
    pub prediction_threshold: usize,
    /// Upper bound on keys returned by a prediction.
    pub max_predictions: usize,
}

impl Default for PredictiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_history_size: 100,
            prediction_threshold: 3,
            max_predictions: 3,
        }
    }
}

/// One recorded lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    pub key: String,
    pub at: Instant,
}

/// Records lookups and prefetches the keys likely to be needed next.
#[derive(Debug)]
pub struct PredictivePreloader<T> {
    preloader: DataPreloader<T>,
    config: PredictiveConfig,
    history: VecDeque<AccessRecord>,
}

impl<T> PredictivePreloader<T> {
    pub fn new(preloader: DataPreloader<T>, config: PredictiveConfig) -> Self {
        Self {
            preloader,
            config,
            history: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &PredictiveConfig {
        &self.config
    }

    /// The wrapped preloader.
    pub fn preloader(&self) -> &DataPreloader<T> {
        &self.preloader
    }

    pub fn record_access(&mut self, key: &str) {
        if !self.config.enabled {
            return;
        }
        self.history.push_back(AccessRecord {
            key: key.to_string(),
            at: Instant::now(),
        });
        while self.history.len() > self.config.max_history_size {
            self.history.pop_front();
        }
    }

    /// Retained records, oldest first.
    pub fn access_history(&self) -> Vec<AccessRecord> {
        self.history.iter().cloned().collect()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Occurrences of each key within the retained history.
    pub fn access_frequency(&self) -> HashMap<String, usize> {
        let mut frequency = HashMap::new();
        for record in &self.history {
            *frequency.entry(record.key.clone()).or_insert(0) += 1;
        }
        frequency
    }

    /// Keys worth prefetching while `current` is being viewed.
    pub fn predict_next_keys(&self, current: &str) -> Vec<String> {
        if !self.config.enabled {
            return Vec::new();
        }

        // key -> (frequency, position of latest access)
        let mut stats: HashMap<&str, (usize, usize)> = HashMap::new();
        for (position, record) in self.history.iter().enumerate() {
            let entry = stats.entry(record.key.as_str()).or_insert((0, 0));
            entry.0 += 1;
            entry.1 = position;
        }

        let mut candidates: Vec<(&str, usize, usize)> = stats
            .into_iter()
            .filter(|(key, (frequency, _))| {
                *key != current && *frequency >= self.config.prediction_threshold
            })
            .map(|(key, (frequency, latest))| (key, frequency, latest))
            .collect();
        candidates.sort_by_key(|&(_, frequency, latest)| (Reverse(frequency), Reverse(latest)));
        candidates.truncate(self.config.max_predictions);

        candidates
            .into_iter()
            .map(|(key, _, _)| key.to_string())
            .collect()
    }
}

impl<T: Clone> PredictivePreloader<T> {
    /// Loads every predicted key through the wrapped preloader, immediately
    /// and one at a time. Failures are logged per key.
    pub async fn prefetch_predicted<F, Fut>(&self, current: &str, load: F)
    where
        F: Fn(&str) -> Fut,
        Fut: Future<Output = anyhow::Result<Option<T>>>,
    {
        if !self.config.enabled {
            return;
        }

        let keys = self.predict_next_keys(current);
        if keys.is_empty() {
            return;
        }
        debug!("Prefetching {} predicted keys after {}", keys.len(), current);

        for key in &keys {
            self.preloader.preload(key, || load(key), true).await;
        }
    }
}
