//! Chords most list views bind.

use crate::chord::Chord;

/// Conventional chords with their descriptions, ready to pair with actions.
pub fn common_chords() -> Vec<(Chord, &'static str)> {
    vec![
        (Chord::new("n").with_ctrl(), "New"),
        (Chord::new("s").with_ctrl(), "Save"),
        (Chord::new("f").with_ctrl(), "Search"),
        (Chord::new("a").with_ctrl(), "Select all"),
        (Chord::new("c").with_ctrl(), "Copy"),
        (Chord::new("v").with_ctrl(), "Paste"),
        (Chord::new("x").with_ctrl(), "Cut"),
        (Chord::new("z").with_ctrl(), "Undo"),
        (Chord::new("y").with_ctrl(), "Redo"),
        (Chord::new("delete"), "Delete"),
        (Chord::new("escape"), "Cancel"),
        (Chord::new("enter"), "Confirm"),
    ]
}
