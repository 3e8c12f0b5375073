//! Engine configuration and per-call options.

use futures::future::{FutureExt, LocalBoxFuture};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Instance-wide defaults for the batch engine.
///
/// Every field can be overridden per call through [`BatchOptions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Items per internal group. `None` puts every item in one group.
    pub batch_size: Option<usize>,
    /// Maximum mutate calls in flight at once.
    pub concurrency: usize,
    /// Extra attempts after a failed mutate call.
    pub retry_count: u32,
    /// Upper bound on a single mutate call (ms).
    pub timeout_ms: Option<u64>,
    /// Pause between groups (ms).
    pub delay_between_batches_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: None,
            concurrency: 1,
            retry_count: 0,
            timeout_ms: None,
            delay_between_batches_ms: 0,
        }
    }
}

/// Snapshot passed to the progress callback after every settled item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressDetail {
    /// Items in the batch.
    pub total: usize,
    /// Items that succeeded or were skipped.
    pub completed: usize,
    /// Items recorded as failed.
    pub failed: usize,
    /// Items not yet settled.
    pub pending: usize,
}

pub(crate) type ValidateFn<'a, T> = Box<dyn Fn(&T) -> bool + 'a>;
pub(crate) type ConfirmFn<'a> = Box<dyn Fn() -> LocalBoxFuture<'a, bool> + 'a>;
pub(crate) type ProgressFn<'a> = Box<dyn FnMut(u8, &ProgressDetail) + 'a>;
pub(crate) type ItemCompleteFn<'a> = Box<dyn FnMut(&str, bool) + 'a>;
pub(crate) type KeyFn<'a, T> = Box<dyn Fn(&T) -> String + 'a>;

/// Per-call options. `T` is the value handed to the mutate function
/// (the item, the update request, or the id).
pub struct BatchOptions<'a, T> {
    pub(crate) batch_size: Option<usize>,
    pub(crate) concurrency: Option<usize>,
    pub(crate) retry_count: Option<u32>,
    pub(crate) stop_on_first_error: bool,
    pub(crate) timeout: Option<Duration>,
    pub(crate) delay_between_batches: Option<Duration>,
    pub(crate) require_confirmation: bool,
    pub(crate) validate: Option<ValidateFn<'a, T>>,
    pub(crate) confirm: Option<ConfirmFn<'a>>,
    pub(crate) on_progress: Option<ProgressFn<'a>>,
    pub(crate) on_item_complete: Option<ItemCompleteFn<'a>>,
    pub(crate) valid_statuses: Option<Vec<String>>,
    pub(crate) key_fn: Option<KeyFn<'a, T>>,
}

impl<T> Default for BatchOptions<'_, T> {
    fn default() -> Self {
        Self {
            batch_size: None,
            concurrency: None,
            retry_count: None,
            stop_on_first_error: false,
            timeout: None,
            delay_between_batches: None,
            require_confirmation: false,
            validate: None,
            confirm: None,
            on_progress: None,
            on_item_complete: None,
            valid_statuses: None,
            key_fn: None,
        }
    }
}

impl<'a, T> BatchOptions<'a, T> {
    /// Creates options that defer everything to the engine config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the group size.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    /// Sets the maximum number of in-flight mutate calls.
    pub fn concurrency(mut self, limit: usize) -> Self {
        self.concurrency = Some(limit);
        self
    }

    /// Sets how many times a failed call is re-attempted.
    pub fn retry_count(mut self, retries: u32) -> Self {
        self.retry_count = Some(retries);
        self
    }

    /// Stops issuing calls once a failure has been recorded.
    pub fn stop_on_first_error(mut self, stop: bool) -> Self {
        self.stop_on_first_error = stop;
        self
    }

    /// Bounds how long a single mutate call is awaited.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Pauses between groups.
    pub fn delay_between_batches(mut self, delay: Duration) -> Self {
        self.delay_between_batches = Some(delay);
        self
    }

    /// Requires a confirmation before anything runs. Without a confirm
    /// function the batch is treated as declined.
    pub fn require_confirmation(mut self, required: bool) -> Self {
        self.require_confirmation = required;
        self
    }

    /// Gates the batch on an async yes/no answer.
    pub fn confirm_with<F, Fut>(mut self, confirm: F) -> Self
    where
        F: Fn() -> Fut + 'a,
        Fut: Future<Output = bool> + 'a,
    {
        self.require_confirmation = true;
        self.confirm = Some(Box::new(move || confirm().boxed_local()));
        self
    }

    /// Skips items the predicate rejects.
    pub fn validate_with<F>(mut self, validate: F) -> Self
    where
        F: Fn(&T) -> bool + 'a,
    {
        self.validate = Some(Box::new(validate));
        self
    }

    /// Receives `(percent, detail)` after every settled item.
    pub fn on_progress<F>(mut self, on_progress: F) -> Self
    where
        F: FnMut(u8, &ProgressDetail) + 'a,
    {
        self.on_progress = Some(Box::new(on_progress));
        self
    }

    /// Receives `(key, succeeded)` after every dispatched item settles.
    pub fn on_item_complete<F>(mut self, on_item_complete: F) -> Self
    where
        F: FnMut(&str, bool) + 'a,
    {
        self.on_item_complete = Some(Box::new(on_item_complete));
        self
    }

    /// Restricts `batch_update_status` to the given statuses.
    pub fn valid_statuses<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_statuses = Some(statuses.into_iter().map(Into::into).collect());
        self
    }

    /// Derives the reported key of a created item. Defaults to its
    /// 1-based position.
    pub fn key_by<F>(mut self, key_fn: F) -> Self
    where
        F: Fn(&T) -> String + 'a,
    {
        self.key_fn = Some(Box::new(key_fn));
        self
    }
}

impl<T> fmt::Debug for BatchOptions<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchOptions")
            .field("batch_size", &self.batch_size)
            .field("concurrency", &self.concurrency)
            .field("retry_count", &self.retry_count)
            .field("stop_on_first_error", &self.stop_on_first_error)
            .field("timeout", &self.timeout)
            .field("delay_between_batches", &self.delay_between_batches)
            .field("require_confirmation", &self.require_confirmation)
            .field("has_validate", &self.validate.is_some())
            .field("has_confirm", &self.confirm.is_some())
            .field("valid_statuses", &self.valid_statuses)
            .finish_non_exhaustive()
    }
}
