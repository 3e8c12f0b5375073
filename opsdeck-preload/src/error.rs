//! Error types for the preload layer.

use thiserror::Error;

/// Result type for preload scheduling.
pub type PreloadResult<T> = Result<T, PreloadError>;

/// Errors that can occur when scheduling a delayed prefetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreloadError {
    /// The preloader is disabled.
    #[error("preloading is disabled")]
    Disabled,

    /// A delayed prefetch is already pending for this key.
    #[error("prefetch already scheduled for key: {0}")]
    AlreadyScheduled(String),

    /// No tokio runtime to schedule a delayed prefetch on.
    #[error("no async runtime available")]
    NoRuntime,
}
