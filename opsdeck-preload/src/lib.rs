//! Preloading for OpsDeck detail views.
//!
//! - [`DataPreloader`]: keyed cache with lazy TTL expiry, in-flight dedup,
//!   optional deferral and delayed (cancellable) prefetches.
//! - [`PredictivePreloader`]: records which keys are looked up and prefetches
//!   the ones that keep coming back.
//! - [`RenderCache`]: a small size- and age-bounded cache for rendered output.
//!
//! All timestamps use [`tokio::time::Instant`], so tests can drive expiry with
//! a paused clock.

mod error;
mod predictive;
mod preloader;
mod render_cache;

pub use error::{PreloadError, PreloadResult};
pub use predictive::{AccessRecord, PredictiveConfig, PredictivePreloader};
pub use preloader::{CacheEntry, DataPreloader, PreloadConfig};
pub use render_cache::{RenderCache, RenderCacheConfig};
