//! Error types for shortcut parsing.

use thiserror::Error;

/// Result type for shortcut operations.
pub type ShortcutResult<T> = Result<T, ShortcutError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortcutError {
    /// The chord string has no key.
    #[error("chord has no key: {0:?}")]
    MissingKey(String),

    /// A modifier name was not recognised.
    #[error("unknown modifier {modifier:?} in chord {chord:?}")]
    UnknownModifier { chord: String, modifier: String },
}
