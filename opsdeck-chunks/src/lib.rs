//! Chunked data loader for paginated list views.
//!
//! A large dataset is addressed in fixed-size chunks (`chunk-0`, `chunk-1`,
//! ...). The loader fetches each chunk at most once through a caller-supplied
//! `fetch(offset, limit)` function, shares in-flight loads between callers,
//! preloads look-ahead chunks in ascending order and trims its cache on
//! request.
//!
//! ```
//! use opsdeck_chunks::{ChunkConfig, ChunkedDataLoader};
//!
//! let loader: ChunkedDataLoader<u32> = ChunkedDataLoader::new(ChunkConfig::default());
//! assert_eq!(loader.chunk_id(45), "chunk-2");
//! assert_eq!(ChunkedDataLoader::<u32>::chunk_index("custom-10"), Some(10));
//! ```

mod error;
mod loader;

pub use error::{ChunkError, ChunkResult};
pub use loader::{Chunk, ChunkConfig, ChunkState, ChunkedDataLoader};
