//! Drag-to-reorder for OpsDeck tables and boards.
//!
//! [`DragReorderEngine`] owns the list being reordered and turns a
//! start / hover / drop gesture into a single permutation, reported through
//! `on_reorder`. Dropping "after" row 5 a row dragged from index 0 leaves
//! it at index 5:
//!
//! ```
//! use opsdeck_reorder::{DragReorderEngine, DropPosition, ReorderConfig};
//!
//! let mut engine = DragReorderEngine::new((1..=8).collect::<Vec<u32>>(), ReorderConfig::default());
//! engine.start_drag(1, 0);
//! engine.handle_drag_over(5, DropPosition::After);
//! assert!(engine.handle_drop());
//! assert_eq!(engine.items(), &[2, 3, 4, 5, 6, 1, 7, 8]);
//! ```

mod engine;

pub use engine::{
    resolve_destination, DragReorderEngine, DragSession, DropPosition, DropTarget, ReorderConfig,
};
