//! Bulk mutation engine for OpsDeck list screens.
//!
//! Drives a caller-supplied mutate function over a sequence of records:
//! - grouping (`batch_size`) and bounded in-flight calls (`concurrency`)
//! - immediate retries and per-call timeouts
//! - validation (rejected items are *skipped*, not failed)
//! - an optional confirmation gate in front of the whole batch
//! - progress callbacks after every settled item
//!
//! Failures of individual items never escape as errors; they are collected
//! into a [`BatchResult`] in input order, which can be exported as CSV or
//! JSON.
//!
//! # Example
//!
//! ```
//! use opsdeck_batch::{BatchOperations, BatchOptions, MutationOutcome};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let engine = BatchOperations::default();
//! let result = engine
//!     .batch_delete(vec![1, 2, 3], |_id: &i32| async { Ok(MutationOutcome::Success) }, BatchOptions::new())
//!     .await;
//!
//! assert!(result.success);
//! assert_eq!(result.deleted().len(), 3);
//! # });
//! ```

mod engine;
mod error;
mod options;
mod result;

pub use engine::{validate_batch, BatchOperations, InvalidItem, UpdateRequest};
pub use error::{BatchError, ExportError, FailureKind};
pub use options::{BatchConfig, BatchOptions, ProgressDetail};
pub use result::{BatchEntry, BatchKind, BatchResult, FailedEntry, MutationOutcome};
