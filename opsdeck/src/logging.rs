//! Subscriber setup for binaries and test harnesses embedding the toolkit.
//!
//! The engines only emit `tracing` events; nothing is printed until the host
//! installs a subscriber, either its own or one of these.

use tracing_subscriber::{fmt, EnvFilter};

/// Filter directives are read from this variable, e.g. `OPSDECK_LOG=opsdeck_chunks=debug`.
pub const LOG_ENV: &str = "OPSDECK_LOG";

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }))
}

/// Installs a compact fmt subscriber as the global default.
///
/// Returns false if a global subscriber was already set.
pub fn try_init(verbose: bool) -> bool {
    fmt()
        .with_env_filter(filter(verbose))
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}

/// Like [`try_init`], ignoring an already-installed subscriber.
pub fn init(verbose: bool) {
    if !try_init(verbose) {
        tracing::debug!("Global subscriber already installed, keeping it");
    }
}
