//! Error types for the batch layer.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Why a single item (or a whole batch) failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// The requested status is not in the allow-list.
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// The mutate function answered with an explicit failure.
    #[error("{0}")]
    Rejected(String),

    /// The mutate function raised instead of answering.
    #[error("{0}")]
    Transport(String),

    /// The mutate call did not settle in time.
    #[error("operation timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl BatchError {
    /// Classifies the error for reporting.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidStatus(_) => FailureKind::Validation,
            Self::Rejected(_) => FailureKind::Operation,
            Self::Transport(_) => FailureKind::Transport,
            Self::Timeout(_) => FailureKind::Timeout,
        }
    }
}

/// Why rendering a [`BatchResult`](crate::BatchResult) export failed.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("json export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("export buffer error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export produced invalid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Coarse failure category recorded on every failed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Rejected before any mutate call was made.
    Validation,
    /// Mutate returned `{ success: false }`.
    Operation,
    /// Mutate raised an error.
    Transport,
    /// Mutate exceeded the configured timeout.
    Timeout,
}
