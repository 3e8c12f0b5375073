//! Shortcut registration table and key dispatch.

use crate::chord::{Chord, KeyEvent, Shortcut};
use crate::surface::{KeyListener, KeySurface, ListenerId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// When false, key events are ignored.
    pub enabled: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// A registered chord as shown in a hint overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutHint {
    pub label: String,
    pub description: String,
}

struct Table {
    shortcuts: HashMap<Chord, Shortcut>,
    enabled: bool,
}

fn lock(table: &Mutex<Table>) -> MutexGuard<'_, Table> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Looks up the event's chord and runs the matching action.
///
/// The action runs after the lock is released so it may re-enter the router.
fn dispatch(table: &Mutex<Table>, event: &mut KeyEvent) -> bool {
    let shortcut = {
        let table = lock(table);
        if !table.enabled {
            return false;
        }
        match table.shortcuts.get(&event.chord()) {
            Some(shortcut) if shortcut.enabled => shortcut.clone(),
            _ => return false,
        }
    };

    if shortcut.prevent_default {
        event.prevent_default();
    }
    debug!("Shortcut {} triggered", shortcut.chord);
    shortcut.run();
    true
}

struct Attachment {
    surface: Arc<dyn KeySurface>,
    id: ListenerId,
}

/// Maps chords to actions and dispatches key events to them.
///
/// Dropping the router detaches it from any key surface.
pub struct ShortcutRouter {
    table: Arc<Mutex<Table>>,
    attachment: Mutex<Option<Attachment>>,
}

impl Default for ShortcutRouter {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

impl fmt::Debug for ShortcutRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = lock(&self.table);
        f.debug_struct("ShortcutRouter")
            .field("enabled", &table.enabled)
            .field("shortcuts", &table.shortcuts.len())
            .finish_non_exhaustive()
    }
}

impl ShortcutRouter {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            table: Arc::new(Mutex::new(Table {
                shortcuts: HashMap::new(),
                enabled: config.enabled,
            })),
            attachment: Mutex::new(None),
        }
    }

    /// Binds a shortcut, replacing (and returning) any previous binding of
    /// the same chord.
    pub fn register(&self, shortcut: Shortcut) -> Option<Shortcut> {
        debug!("Registering shortcut {} ({})", shortcut.chord, shortcut.description);
        lock(&self.table)
            .shortcuts
            .insert(shortcut.chord.clone(), shortcut)
    }

    pub fn unregister(&self, chord: &Chord) -> Option<Shortcut> {
        lock(&self.table).shortcuts.remove(chord)
    }

    pub fn get_shortcut(&self, chord: &Chord) -> Option<Shortcut> {
        lock(&self.table).shortcuts.get(chord).cloned()
    }

    /// Every registered shortcut, ordered by chord.
    pub fn get_shortcuts(&self) -> Vec<Shortcut> {
        let mut shortcuts: Vec<Shortcut> = lock(&self.table).shortcuts.values().cloned().collect();
        shortcuts.sort_by(|a, b| a.chord.cmp(&b.chord));
        shortcuts
    }

    /// Labels and descriptions of the enabled shortcuts, ordered by chord.
    pub fn hints(&self) -> Vec<ShortcutHint> {
        self.get_shortcuts()
            .into_iter()
            .filter(|s| s.enabled)
            .map(|s| ShortcutHint {
                label: s.chord.label(),
                description: s.description,
            })
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.table).shortcuts.clear();
    }

    pub fn enable(&self) {
        lock(&self.table).enabled = true;
    }

    pub fn disable(&self) {
        lock(&self.table).enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.table).enabled
    }

    /// Runs the shortcut bound to the event's chord, if any.
    ///
    /// Returns true if an action ran.
    pub fn handle_key_down(&self, event: &mut KeyEvent) -> bool {
        dispatch(&self.table, event)
    }

    /// Subscribes to `surface`, replacing any previous subscription.
    pub fn attach_global_listener(&self, surface: Arc<dyn KeySurface>) {
        self.detach_global_listener();

        let table: Weak<Mutex<Table>> = Arc::downgrade(&self.table);
        let listener: KeyListener = Arc::new(move |event: &mut KeyEvent| match table.upgrade() {
            Some(table) => dispatch(&table, event),
            None => false,
        });
        let id = surface.add_listener(listener);

        info!("Shortcut router attached to key surface");
        *self.attachment_slot() = Some(Attachment { surface, id });
    }

    /// Unsubscribes from the key surface. Safe to call when not attached.
    pub fn detach_global_listener(&self) {
        let previous = self.attachment_slot().take();
        if let Some(Attachment { surface, id }) = previous {
            surface.remove_listener(id);
            info!("Shortcut router detached from key surface");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attachment_slot().is_some()
    }

    fn attachment_slot(&self) -> MutexGuard<'_, Option<Attachment>> {
        self.attachment.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ShortcutRouter {
    fn drop(&mut self) {
        self.detach_global_listener();
    }
}
