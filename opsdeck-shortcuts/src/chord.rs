//! Chords, key events and shortcut definitions.

use crate::error::{ShortcutError, ShortcutResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A key plus the exact set of modifiers held with it.
///
/// The key is stored lower-cased, so `"S"` and `"s"` name the same chord.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Chord {
    #[serde(deserialize_with = "lowercase")]
    key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

fn lowercase<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|key| key.to_lowercase())
}

impl Chord {
    /// An unmodified chord for `key`.
    pub fn new(key: impl AsRef<str>) -> Self {
        Self {
            key: key.as_ref().to_lowercase(),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// The lower-cased key.
    pub fn key(&self) -> &str {
        &self.key
    }

    fn modifier_names(&self) -> impl Iterator<Item = &'static str> {
        [
            (self.ctrl, "Ctrl"),
            (self.shift, "Shift"),
            (self.alt, "Alt"),
            (self.meta, "Meta"),
        ]
        .into_iter()
        .filter_map(|(held, name)| held.then_some(name))
    }

    /// Human-readable hint, e.g. `"Ctrl + Shift + S"`.
    pub fn label(&self) -> String {
        let mut parts: Vec<String> = self.modifier_names().map(str::to_string).collect();
        parts.push(self.key.to_uppercase());
        parts.join(" + ")
    }
}

/// Formats as `ctrl+shift+s`, which [`FromStr`] parses back.
impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in self.modifier_names() {
            write!(f, "{}+", name.to_lowercase())?;
        }
        f.write_str(&self.key)
    }
}

impl FromStr for Chord {
    type Err = ShortcutError;

    fn from_str(s: &str) -> ShortcutResult<Self> {
        let s = s.trim();
        // A trailing "++" binds the plus key itself.
        let (modifiers, key) = if s == "+" {
            ("", "+")
        } else if let Some(rest) = s.strip_suffix("++") {
            (rest, "+")
        } else {
            s.rsplit_once('+').unwrap_or(("", s))
        };

        if key.trim().is_empty() {
            return Err(ShortcutError::MissingKey(s.to_string()));
        }

        let mut chord = Chord::new(key.trim());
        for modifier in modifiers.split('+').map(str::trim).filter(|m| !m.is_empty()) {
            match modifier.to_lowercase().as_str() {
                "ctrl" | "control" => chord.ctrl = true,
                "shift" => chord.shift = true,
                "alt" | "option" => chord.alt = true,
                "meta" | "cmd" | "command" | "super" => chord.meta = true,
                _ => {
                    return Err(ShortcutError::UnknownModifier {
                        chord: s.to_string(),
                        modifier: modifier.to_string(),
                    });
                }
            }
        }
        Ok(chord)
    }
}

/// A key press as delivered by a key surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
    default_prevented: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
            default_prevented: false,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// The chord this event would trigger.
    pub fn chord(&self) -> Chord {
        Chord {
            key: self.key.to_lowercase(),
            ctrl: self.ctrl,
            shift: self.shift,
            alt: self.alt,
            meta: self.meta,
        }
    }

    /// Suppresses the surface's default handling of this key.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Callback run when a shortcut fires.
pub type Action = Arc<dyn Fn() + Send + Sync>;

/// A chord bound to an action.
#[derive(Clone)]
pub struct Shortcut {
    pub chord: Chord,
    pub description: String,
    /// A disabled shortcut stays registered but never fires.
    pub enabled: bool,
    /// Mark matching events as default-prevented.
    pub prevent_default: bool,
    action: Action,
}

impl Shortcut {
    pub fn new(
        chord: Chord,
        description: impl Into<String>,
        action: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            chord,
            description: description.into(),
            enabled: true,
            prevent_default: true,
            action: Arc::new(action),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Lets matching events keep their default handling.
    pub fn allow_default(mut self) -> Self {
        self.prevent_default = false;
        self
    }

    pub fn run(&self) {
        (self.action)();
    }
}

impl fmt::Debug for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shortcut")
            .field("chord", &self.chord)
            .field("description", &self.description)
            .field("enabled", &self.enabled)
            .field("prevent_default", &self.prevent_default)
            .finish_non_exhaustive()
    }
}
