//! Drag state machine.
//!
//! ```text
//!   idle --start_drag--> dragging --handle_drop / cancel_drag--> idle
//!                           |  ^
//!                           +--+ handle_drag_over (records drop target)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// Engine switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReorderConfig {
    /// When false, gestures have no effect.
    pub enabled: bool,
    /// Accept drags whose origin lies outside the current list.
    pub cross_list: bool,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cross_list: false,
        }
    }
}

/// Side of the hovered row the item would land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPosition {
    Before,
    After,
}

/// Candidate destination recorded while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropTarget {
    pub index: usize,
    pub position: DropPosition,
}

/// The active drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession<T> {
    /// Time-ordered id, unique per gesture.
    pub id: Uuid,
    pub item: T,
    pub origin: usize,
}

/// Index the dragged item lands on once it has been removed from `origin`.
///
/// `len` is the length of the list before removal. When `origin` lies
/// outside the list (cross-list drags) nothing is removed first.
pub fn resolve_destination(origin: usize, target: DropTarget, len: usize) -> usize {
    let mut dest = match target.position {
        DropPosition::Before => target.index,
        DropPosition::After => target.index.saturating_add(1),
    };
    let removed = origin < len;
    if removed && origin < dest {
        dest -= 1;
    }
    let max = if removed { len - 1 } else { len };
    dest.min(max)
}

type ItemFn<T> = Box<dyn FnMut(&T) + Send>;
type ReorderFn<T> = Box<dyn FnMut(&[T]) + Send>;

/// Turns drag gestures over a list into reorders.
pub struct DragReorderEngine<T> {
    items: Vec<T>,
    config: ReorderConfig,
    session: Option<DragSession<T>>,
    target: Option<DropTarget>,
    on_reorder: Option<ReorderFn<T>>,
    on_drag_start: Option<ItemFn<T>>,
    on_drag_end: Option<ItemFn<T>>,
}

impl<T: fmt::Debug> fmt::Debug for DragReorderEngine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragReorderEngine")
            .field("items", &self.items)
            .field("config", &self.config)
            .field("session", &self.session)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl<T: Clone> DragReorderEngine<T> {
    pub fn new(items: Vec<T>, config: ReorderConfig) -> Self {
        Self {
            items,
            config,
            session: None,
            target: None,
            on_reorder: None,
            on_drag_start: None,
            on_drag_end: None,
        }
    }

    /// Receives the new list after every committed reorder.
    pub fn on_reorder(mut self, f: impl FnMut(&[T]) + Send + 'static) -> Self {
        self.on_reorder = Some(Box::new(f));
        self
    }

    pub fn on_drag_start(mut self, f: impl FnMut(&T) + Send + 'static) -> Self {
        self.on_drag_start = Some(Box::new(f));
        self
    }

    /// Fires whenever an active drag ends, dropped or cancelled.
    pub fn on_drag_end(mut self, f: impl FnMut(&T) + Send + 'static) -> Self {
        self.on_drag_end = Some(Box::new(f));
        self
    }

    pub fn config(&self) -> ReorderConfig {
        self.config
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Replaces the list. Safe mid-drag; the session keeps its origin.
    pub fn update_items(&mut self, items: Vec<T>) {
        self.items = items;
    }

    pub fn enable(&mut self) {
        self.config.enabled = true;
    }

    /// Suppresses gesture side effects. An active session is kept.
    pub fn disable(&mut self) {
        self.config.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn dragged_item(&self) -> Option<&DragSession<T>> {
        self.session.as_ref()
    }

    pub fn drop_target(&self) -> Option<DropTarget> {
        self.target
    }

    pub fn start_drag(&mut self, item: T, index: usize) {
        if !self.config.enabled || self.items.is_empty() {
            return;
        }
        if !self.config.cross_list && index >= self.items.len() {
            debug!("Ignoring drag from index {} outside {} items", index, self.items.len());
            return;
        }

        let session = DragSession {
            id: Uuid::now_v7(),
            item,
            origin: index,
        };
        debug!("Drag {} started at index {}", session.id, index);
        if let Some(cb) = self.on_drag_start.as_mut() {
            cb(&session.item);
        }
        self.session = Some(session);
        self.target = None;
    }

    pub fn handle_drag_over(&mut self, index: usize, position: DropPosition) {
        if !self.config.enabled || self.session.is_none() {
            return;
        }
        self.target = Some(DropTarget { index, position });
    }

    /// Commits the drag. Returns true if the list changed.
    pub fn handle_drop(&mut self) -> bool {
        if !self.config.enabled {
            return false;
        }
        let Some(session) = self.session.take() else {
            return false;
        };
        let target = self.target.take();

        let reordered = match target.and_then(|t| self.reordered(&session, t)) {
            Some(next) => {
                debug!("Drag {} reordered {} items", session.id, next.len());
                self.items = next;
                if let Some(cb) = self.on_reorder.as_mut() {
                    cb(&self.items);
                }
                true
            }
            None => {
                debug!("Drag {} dropped without moving", session.id);
                false
            }
        };

        if let Some(cb) = self.on_drag_end.as_mut() {
            cb(&session.item);
        }
        reordered
    }

    pub fn cancel_drag(&mut self) {
        if !self.config.enabled {
            return;
        }
        self.target = None;
        if let Some(session) = self.session.take() {
            debug!("Drag {} cancelled", session.id);
            if let Some(cb) = self.on_drag_end.as_mut() {
                cb(&session.item);
            }
        }
    }

    /// True while dragging, enabled, and `index` is not the origin.
    pub fn can_drop_at(&self, index: usize) -> bool {
        self.config.enabled && self.session.as_ref().is_some_and(|s| s.origin != index)
    }

    fn reordered(&self, session: &DragSession<T>, target: DropTarget) -> Option<Vec<T>> {
        let len = self.items.len();
        let origin = session.origin;
        // The list may have shrunk under the drag; only cross-list drags insert.
        if origin >= len && !self.config.cross_list {
            debug!("Drag {} origin {} no longer in {} items", session.id, origin, len);
            return None;
        }
        let dest = resolve_destination(origin, target, len);

        let mut next = self.items.clone();
        let moved = if origin < len {
            if dest == origin {
                return None;
            }
            next.remove(origin)
        } else {
            session.item.clone()
        };
        next.insert(dest, moved);
        Some(next)
    }
}
