//! Batch engine: drives caller-supplied mutate functions over a sequence.
//!
//! The engine never touches the items itself. It dispatches mutate calls in
//! groups, bounds how many are in flight, retries failures, and records every
//! outcome in input order.

use crate::error::BatchError;
use crate::options::{BatchConfig, BatchOptions, ProgressDetail, ProgressFn};
use crate::result::{BatchEntry, BatchKind, BatchResult, FailedEntry, MutationOutcome};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// An update descriptor: which record, and what to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest<K, D> {
    pub id: K,
    pub data: D,
}

impl<K, D> UpdateRequest<K, D> {
    pub fn new(id: K, data: D) -> Self {
        Self { id, data }
    }
}

/// An item rejected by [`validate_batch`].
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidItem<'a, T> {
    pub position: usize,
    pub item: &'a T,
    pub error: String,
}

/// Runs a validator over every item without mutating anything.
pub fn validate_batch<T, F>(items: &[T], validator: F) -> Vec<InvalidItem<'_, T>>
where
    F: Fn(&T) -> Result<(), String>,
{
    items
        .iter()
        .enumerate()
        .filter_map(|(position, item)| {
            validator(item).err().map(|error| InvalidItem {
                position,
                item,
                error: if error.is_empty() {
                    "validation failed".to_string()
                } else {
                    error
                },
            })
        })
        .collect()
}

enum Settled {
    Succeeded,
    Skipped,
    Failed(BatchError),
}

/// The batch operation engine.
#[derive(Debug, Clone, Default)]
pub struct BatchOperations {
    config: BatchConfig,
}

impl BatchOperations {
    /// Creates an engine with the given defaults.
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Returns the engine defaults.
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Creates every item through `create`.
    pub async fn batch_create<T, F, Fut>(
        &self,
        items: Vec<T>,
        create: F,
        mut options: BatchOptions<'_, T>,
    ) -> BatchResult<T>
    where
        F: Fn(&T) -> Fut,
        Fut: Future<Output = anyhow::Result<MutationOutcome>>,
    {
        let keys = match options.key_fn.take() {
            Some(key_fn) => items.iter().map(|item| key_fn(item)).collect(),
            None => (1..=items.len()).map(|p| p.to_string()).collect(),
        };
        self.run(BatchKind::Create, items, keys, create, options).await
    }

    /// Applies each `{ id, data }` through `update(id, data)`.
    pub async fn batch_update<K, D, F, Fut>(
        &self,
        updates: Vec<UpdateRequest<K, D>>,
        update: F,
        options: BatchOptions<'_, UpdateRequest<K, D>>,
    ) -> BatchResult<UpdateRequest<K, D>>
    where
        K: Display,
        F: Fn(&K, &D) -> Fut,
        Fut: Future<Output = anyhow::Result<MutationOutcome>>,
    {
        let keys = updates.iter().map(|u| u.id.to_string()).collect();
        self.run(
            BatchKind::Update,
            updates,
            keys,
            |req: &UpdateRequest<K, D>| update(&req.id, &req.data),
            options,
        )
        .await
    }

    /// Deletes every id through `delete`.
    pub async fn batch_delete<K, F, Fut>(
        &self,
        ids: Vec<K>,
        delete: F,
        options: BatchOptions<'_, K>,
    ) -> BatchResult<K>
    where
        K: Display,
        F: Fn(&K) -> Fut,
        Fut: Future<Output = anyhow::Result<MutationOutcome>>,
    {
        let keys = ids.iter().map(ToString::to_string).collect();
        self.run(BatchKind::Delete, ids, keys, delete, options).await
    }

    /// Moves every id to `status` through `update(id, status)`.
    ///
    /// A status outside the configured allow-list fails the whole batch
    /// before any call is made.
    pub async fn batch_update_status<K, F, Fut>(
        &self,
        ids: Vec<K>,
        status: &str,
        update: F,
        options: BatchOptions<'_, K>,
    ) -> BatchResult<K>
    where
        K: Display,
        F: Fn(&K, &str) -> Fut,
        Fut: Future<Output = anyhow::Result<MutationOutcome>>,
    {
        if let Some(valid) = &options.valid_statuses {
            if !valid.iter().any(|s| s == status) {
                let error = BatchError::InvalidStatus(status.to_string());
                warn!("Rejected status batch of {} items: {}", ids.len(), error);
                return BatchResult::rejected(BatchKind::UpdateStatus, status.to_string(), &error);
            }
        }

        let keys = ids.iter().map(ToString::to_string).collect();
        self.run(
            BatchKind::UpdateStatus,
            ids,
            keys,
            |id: &K| update(id, status),
            options,
        )
        .await
    }

    async fn run<X, F, Fut>(
        &self,
        kind: BatchKind,
        items: Vec<X>,
        keys: Vec<String>,
        mutate: F,
        options: BatchOptions<'_, X>,
    ) -> BatchResult<X>
    where
        F: Fn(&X) -> Fut,
        Fut: Future<Output = anyhow::Result<MutationOutcome>>,
    {
        let total = items.len();
        if total == 0 {
            debug!("Empty {} batch, nothing to do", kind);
            return BatchResult::empty(kind);
        }

        let BatchOptions {
            batch_size,
            concurrency,
            retry_count,
            stop_on_first_error,
            timeout,
            delay_between_batches,
            require_confirmation,
            validate,
            confirm,
            mut on_progress,
            mut on_item_complete,
            ..
        } = options;

        if require_confirmation {
            let confirmed = match &confirm {
                Some(confirm) => confirm().await,
                None => {
                    warn!("{} batch requires confirmation but no confirm function was given", kind);
                    false
                }
            };
            if !confirmed {
                info!("{} batch of {} items declined at confirmation", kind, total);
                return BatchResult::declined(kind);
            }
        }

        let group_size = batch_size.or(self.config.batch_size).unwrap_or(total).max(1);
        let concurrency = concurrency.unwrap_or(self.config.concurrency).max(1);
        let retries = retry_count.unwrap_or(self.config.retry_count);
        let timeout = timeout.or(self.config.timeout_ms.map(Duration::from_millis));
        let delay = delay_between_batches
            .unwrap_or(Duration::from_millis(self.config.delay_between_batches_ms));
        let fallback = kind.fallback_error();

        let mut slots: Vec<Option<Settled>> = (0..total).map(|_| None).collect();
        let mut completed = 0usize;
        let mut failed = 0usize;
        let mut stopped = false;

        let positions: Vec<usize> = (0..total).collect();
        let group_count = positions.chunks(group_size).len();

        for (group_idx, group) in positions.chunks(group_size).enumerate() {
            if stopped {
                break;
            }
            debug!(
                "{} batch: group {}/{} ({} items)",
                kind,
                group_idx + 1,
                group_count,
                group.len()
            );

            let mut queue = group.iter().copied();
            let mut in_flight = FuturesUnordered::new();

            loop {
                while !stopped && in_flight.len() < concurrency {
                    let Some(pos) = queue.next() else { break };
                    let item = &items[pos];

                    if let Some(validate) = &validate {
                        if !validate(item) {
                            debug!("Skipping {} item {}: validation rejected", kind, keys[pos]);
                            slots[pos] = Some(Settled::Skipped);
                            completed += 1;
                            report(&mut on_progress, total, completed, failed);
                            continue;
                        }
                    }

                    let call = attempt(&mutate, item, retries, timeout, fallback);
                    in_flight.push(async move { (pos, call.await) });
                }

                let Some((pos, outcome)) = in_flight.next().await else {
                    break;
                };

                let succeeded = outcome.is_ok();
                match outcome {
                    Ok(()) => {
                        completed += 1;
                        slots[pos] = Some(Settled::Succeeded);
                    }
                    Err(error) => {
                        failed += 1;
                        debug!("{} item {} failed: {}", kind, keys[pos], error);
                        slots[pos] = Some(Settled::Failed(error));
                        if stop_on_first_error && !stopped {
                            warn!("{} batch stopping after first failure at item {}", kind, keys[pos]);
                            stopped = true;
                        }
                    }
                }

                if let Some(cb) = on_item_complete.as_mut() {
                    cb(&keys[pos], succeeded);
                }
                report(&mut on_progress, total, completed, failed);
            }

            if !stopped && !delay.is_zero() && group_idx + 1 < group_count {
                tokio::time::sleep(delay).await;
            }
        }

        let mut result = BatchResult::empty(kind);
        for (position, ((item, key), slot)) in items.into_iter().zip(keys).zip(slots).enumerate() {
            match slot {
                Some(Settled::Succeeded) => result.succeeded.push(BatchEntry {
                    key,
                    position,
                    value: item,
                }),
                Some(Settled::Skipped) => result.skipped.push(BatchEntry {
                    key,
                    position,
                    value: item,
                }),
                Some(Settled::Failed(error)) => result.failed.push(FailedEntry::from_error(
                    key,
                    Some(position),
                    Some(item),
                    &error,
                )),
                None => result.not_attempted.push(key),
            }
        }
        result.success = result.failed.is_empty();

        info!(
            "{} batch finished: {} succeeded, {} skipped, {} failed, {} not attempted",
            kind,
            result.succeeded.len(),
            result.skipped.len(),
            result.failed.len(),
            result.not_attempted.len()
        );
        result
    }
}

/// Calls `mutate` until it succeeds or the retries run out.
async fn attempt<X, F, Fut>(
    mutate: &F,
    item: &X,
    retries: u32,
    timeout: Option<Duration>,
    fallback: &str,
) -> Result<(), BatchError>
where
    F: Fn(&X) -> Fut,
    Fut: Future<Output = anyhow::Result<MutationOutcome>>,
{
    let mut last: Option<BatchError> = None;

    for round in 0..=retries {
        if let Some(previous) = &last {
            debug!("Retrying mutate call (attempt {}/{}): {}", round + 1, retries + 1, previous);
        }

        let call = mutate(item);
        let answer = match timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(answer) => answer,
                Err(_) => {
                    last = Some(BatchError::Timeout(limit));
                    continue;
                }
            },
            None => call.await,
        };

        last = Some(match answer {
            Ok(MutationOutcome::Success) => return Ok(()),
            Ok(MutationOutcome::Failure { error }) => {
                BatchError::Rejected(error.unwrap_or_else(|| fallback.to_string()))
            }
            Err(e) => BatchError::Transport(e.to_string()),
        });
    }

    Err(last.unwrap_or_else(|| BatchError::Rejected(fallback.to_string())))
}

fn report(
    on_progress: &mut Option<ProgressFn<'_>>,
    total: usize,
    completed: usize,
    failed: usize,
) {
    if let Some(cb) = on_progress.as_mut() {
        let settled = completed + failed;
        let percent = (settled * 100 / total) as u8;
        let detail = ProgressDetail {
            total,
            completed,
            failed,
            pending: total - settled,
        };
        cb(percent, &detail);
    }
}
