//! Key surfaces: where key events come from.
//!
//! A [`KeySurface`] is anything routers can subscribe to for key-down
//! events (a window, a focused panel, a test harness). [`KeyEventBus`] is
//! the in-process implementation.

use crate::chord::KeyEvent;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Handle returned by [`KeySurface::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Receives key-down events. Returns true if it handled the event.
pub type KeyListener = Arc<dyn Fn(&mut KeyEvent) -> bool + Send + Sync>;

/// A source of key-down events.
pub trait KeySurface: Send + Sync {
    fn add_listener(&self, listener: KeyListener) -> ListenerId;

    /// Returns false if `id` was not subscribed.
    fn remove_listener(&self, id: ListenerId) -> bool;
}

/// Fans key events out to every subscribed listener, in subscription order.
#[derive(Default)]
pub struct KeyEventBus {
    listeners: Mutex<Vec<(ListenerId, KeyListener)>>,
    next_id: AtomicU64,
}

impl KeyEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<(ListenerId, KeyListener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Delivers `event` to every listener. Returns true if any handled it.
    pub fn dispatch(&self, event: &mut KeyEvent) -> bool {
        let listeners: Vec<KeyListener> = self.listeners().iter().map(|(_, l)| Arc::clone(l)).collect();
        let mut handled = false;
        for listener in listeners {
            handled |= listener(&mut *event);
        }
        handled
    }

    pub fn listener_count(&self) -> usize {
        self.listeners().len()
    }
}

impl KeySurface for KeyEventBus {
    fn add_listener(&self, listener: KeyListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners().push((id, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }
}

impl fmt::Debug for KeyEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyEventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
