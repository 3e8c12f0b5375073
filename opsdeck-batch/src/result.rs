//! Aggregated outcome of a batch run and its export views.

use crate::error::{BatchError, ExportError, FailureKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which bulk operation produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    Create,
    Update,
    Delete,
    UpdateStatus,
}

impl BatchKind {
    /// Message recorded when the mutate function fails without saying why.
    pub(crate) fn fallback_error(self) -> &'static str {
        match self {
            Self::Create => "create failed",
            Self::Update | Self::UpdateStatus => "update failed",
            Self::Delete => "delete failed",
        }
    }
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::UpdateStatus => "update_status",
        };
        f.write_str(name)
    }
}

/// Per-item answer from a mutate function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationOutcome {
    Success,
    Failure { error: Option<String> },
}

impl MutationOutcome {
    /// Shorthand for an explicit failure with a message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: Some(error.into()),
        }
    }

    /// Returns true for [`MutationOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// An item that succeeded or was skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry<V> {
    /// Caller id, or 1-based position for created items.
    pub key: String,
    /// Index in the input sequence.
    pub position: usize,
    pub value: V,
}

/// An item that failed, or a synthetic batch-level failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedEntry<V> {
    pub key: String,
    /// `None` for batch-level failures that belong to no item.
    pub position: Option<usize>,
    pub value: Option<V>,
    /// Message of the last attempt.
    pub error: String,
    pub kind: FailureKind,
}

impl<V> FailedEntry<V> {
    pub(crate) fn from_error(key: String, position: Option<usize>, value: Option<V>, error: &BatchError) -> Self {
        Self {
            key,
            position,
            value,
            error: error.to_string(),
            kind: error.kind(),
        }
    }
}

/// Ordered outcome of a batch operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult<V> {
    pub kind: BatchKind,
    /// True iff `failed` is empty.
    pub success: bool,
    pub succeeded: Vec<BatchEntry<V>>,
    pub skipped: Vec<BatchEntry<V>>,
    pub failed: Vec<FailedEntry<V>>,
    /// Keys never dispatched because the run stopped early.
    pub not_attempted: Vec<String>,
    /// The confirmation gate answered no; nothing ran.
    pub confirmation_declined: bool,
}

impl<V> BatchResult<V> {
    pub(crate) fn empty(kind: BatchKind) -> Self {
        Self {
            kind,
            success: true,
            succeeded: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            not_attempted: Vec::new(),
            confirmation_declined: false,
        }
    }

    pub(crate) fn declined(kind: BatchKind) -> Self {
        Self {
            confirmation_declined: true,
            ..Self::empty(kind)
        }
    }

    pub(crate) fn rejected(kind: BatchKind, key: String, error: &BatchError) -> Self {
        Self {
            success: false,
            failed: vec![FailedEntry::from_error(key, None, None, error)],
            ..Self::empty(kind)
        }
    }

    fn view(&self, kind: BatchKind) -> &[BatchEntry<V>] {
        if self.kind == kind {
            &self.succeeded
        } else {
            &[]
        }
    }

    /// Succeeded entries of a create batch.
    pub fn created(&self) -> &[BatchEntry<V>] {
        self.view(BatchKind::Create)
    }

    /// Succeeded entries of an update or status batch.
    pub fn updated(&self) -> &[BatchEntry<V>] {
        if self.kind == BatchKind::UpdateStatus {
            &self.succeeded
        } else {
            self.view(BatchKind::Update)
        }
    }

    /// Succeeded entries of a delete batch.
    pub fn deleted(&self) -> &[BatchEntry<V>] {
        self.view(BatchKind::Delete)
    }

    /// Number of items that reached a final state.
    pub fn processed(&self) -> usize {
        self.succeeded.len() + self.skipped.len() + self.failed.len()
    }

    /// Messages of every failed entry, in order.
    pub fn errors(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.error.as_str()).collect()
    }

    fn rows(&self) -> Vec<ExportRow<'_, V>> {
        let mut rows: Vec<ExportRow<'_, V>> = self
            .succeeded
            .iter()
            .map(|e| ExportRow::entry(e, ExportStatus::Success))
            .chain(self.skipped.iter().map(|e| ExportRow::entry(e, ExportStatus::Skipped)))
            .chain(self.failed.iter().map(ExportRow::failed))
            .collect();
        rows.sort_by_key(|r| r.position.unwrap_or(usize::MAX));
        rows
    }

    /// Renders `id,status,error` rows in input order.
    pub fn export_csv(&self) -> Result<String, ExportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["id", "status", "error"])?;
        for row in self.rows() {
            writer.write_record([row.id, row.status.as_str(), row.error.unwrap_or("")])?;
        }
        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8(bytes)?)
    }
}

impl<V: Serialize> BatchResult<V> {
    /// Renders one JSON object per entry, in input order.
    pub fn export_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(&self.rows())?)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
enum ExportStatus {
    Success,
    Skipped,
    Failed,
}

impl ExportStatus {
    fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

#[derive(Serialize)]
struct ExportRow<'a, V> {
    id: &'a str,
    status: ExportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip)]
    position: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a V>,
}

impl<'a, V> ExportRow<'a, V> {
    fn entry(entry: &'a BatchEntry<V>, status: ExportStatus) -> Self {
        Self {
            id: &entry.key,
            status,
            error: None,
            position: Some(entry.position),
            value: Some(&entry.value),
        }
    }

    fn failed(entry: &'a FailedEntry<V>) -> Self {
        Self {
            id: &entry.key,
            status: ExportStatus::Failed,
            error: Some(&entry.error),
            position: entry.position,
            value: entry.value.as_ref(),
        }
    }
}
