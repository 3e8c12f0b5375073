//! Keyboard shortcut routing for OpsDeck.
//!
//! A [`ShortcutRouter`] maps [`Chord`]s to actions. Key events are fed to it
//! directly with [`ShortcutRouter::handle_key_down`], or the router subscribes
//! itself to a [`KeySurface`] such as the in-process [`KeyEventBus`].
//!
//! ```
//! use opsdeck_shortcuts::{KeyEvent, RouterConfig, Shortcut, ShortcutRouter};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let saves = Arc::new(AtomicUsize::new(0));
//! let router = ShortcutRouter::new(RouterConfig::default());
//! let counter = Arc::clone(&saves);
//! router.register(Shortcut::new("ctrl+s".parse().unwrap(), "Save", move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! }));
//!
//! let mut event = KeyEvent::new("S").with_ctrl();
//! assert!(router.handle_key_down(&mut event));
//! assert!(event.default_prevented());
//! assert_eq!(saves.load(Ordering::SeqCst), 1);
//! assert!(!router.handle_key_down(&mut KeyEvent::new("s")));
//! ```

mod chord;
mod error;
mod presets;
mod router;
mod surface;

pub use chord::{Action, Chord, KeyEvent, Shortcut};
pub use error::{ShortcutError, ShortcutResult};
pub use presets::common_chords;
pub use router::{RouterConfig, ShortcutHint, ShortcutRouter};
pub use surface::{KeyEventBus, KeyListener, KeySurface, ListenerId};
