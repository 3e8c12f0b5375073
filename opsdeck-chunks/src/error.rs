//! Error types for the chunk loader.

use thiserror::Error;

/// Result type for chunk operations.
pub type ChunkResult<T> = Result<T, ChunkError>;

/// Errors returned by [`crate::ChunkedDataLoader::load_chunk`].
///
/// Cloneable so that every waiter on a shared load receives the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    /// The id carries no trailing chunk number.
    #[error("invalid chunk id: {0}")]
    InvalidChunkId(String),

    /// The fetch function raised.
    #[error("fetch failed: {0}")]
    Fetch(String),
}
