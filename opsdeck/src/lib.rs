//! OpsDeck: client-side machinery for large list views.
//!
//! Each engine lives in its own crate and is re-exported here:
//!
//! | Module        | Crate               |
//! |---------------|---------------------|
//! | [`batch`]     | `opsdeck-batch`     |
//! | [`chunks`]    | `opsdeck-chunks`    |
//! | [`preload`]   | `opsdeck-preload`   |
//! | [`reorder`]   | `opsdeck-reorder`   |
//! | [`shortcuts`] | `opsdeck-shortcuts` |
//!
//! [`ToolkitConfig`] gathers the engine configs into one document and
//! [`logging`] installs a `tracing` subscriber for hosts that lack one.

pub mod config;
pub mod logging;

pub use config::{ConfigError, ConfigResult, ToolkitConfig};

pub use opsdeck_batch as batch;
pub use opsdeck_chunks as chunks;
pub use opsdeck_preload as preload;
pub use opsdeck_reorder as reorder;
pub use opsdeck_shortcuts as shortcuts;
