/// Keyboard command mapping.
///
/// Each chord maps to one [`Command`]; a command runs only while selection is
/// enabled and its category is allowed by [`KeyboardConfig`]. Everything
/// else is silently ignored.
pub mod chord;

pub use chord::{Key, KeyChord, Modifiers};
#[cfg(feature = "egui")]
pub use chord::chords_from_egui_input;

use crate::mutations::MoveDirection;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyboardConfig {
    pub enabled: bool,
    pub allow_arrow_navigation: bool,
    pub allow_copy_paste: bool,
    pub allow_delete: bool,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_arrow_navigation: true,
            allow_copy_paste: true,
            allow_delete: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// `Escape`: clear the selection, or go up a level.
    Escape,
    /// `Enter`: select the first navigable child.
    SelectFirstChild,
    /// `Shift+Enter`
    SelectParent,
    /// `Tab` / `Shift+Tab`
    NextSibling,
    PreviousSibling,
    Move(MoveDirection),
    Copy,
    Cut,
    Paste,
    Duplicate,
    Delete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Navigation,
    Arrows,
    Clipboard,
    Delete,
}

impl Command {
    pub fn from_chord(chord: &KeyChord) -> Option<Command> {
        let m = chord.modifiers;
        let cmd = match (chord.key, m.command, m.shift) {
            (Key::Escape, false, _) => Command::Escape,
            (Key::Enter, false, false) => Command::SelectFirstChild,
            (Key::Enter, false, true) => Command::SelectParent,
            (Key::Tab, false, false) => Command::NextSibling,
            (Key::Tab, false, true) => Command::PreviousSibling,
            (Key::ArrowUp, false, _) => Command::Move(MoveDirection::Up),
            (Key::ArrowDown, false, _) => Command::Move(MoveDirection::Down),
            (Key::ArrowLeft, false, _) => Command::Move(MoveDirection::Left),
            (Key::ArrowRight, false, _) => Command::Move(MoveDirection::Right),
            (Key::C, true, false) => Command::Copy,
            (Key::X, true, false) => Command::Cut,
            (Key::V, true, false) => Command::Paste,
            (Key::D, true, false) => Command::Duplicate,
            (Key::Delete | Key::Backspace, false, false) => Command::Delete,
            _ => return None,
        };
        Some(cmd)
    }

    pub fn category(self) -> Category {
        match self {
            Command::Escape
            | Command::SelectFirstChild
            | Command::SelectParent
            | Command::NextSibling
            | Command::PreviousSibling => Category::Navigation,
            Command::Move(_) => Category::Arrows,
            Command::Copy | Command::Cut | Command::Paste | Command::Duplicate => Category::Clipboard,
            Command::Delete => Category::Delete,
        }
    }
}

impl KeyboardConfig {
    pub fn allows(&self, category: Category) -> bool {
        self.enabled
            && match category {
                Category::Navigation => true,
                Category::Arrows => self.allow_arrow_navigation,
                Category::Clipboard => self.allow_copy_paste,
                Category::Delete => self.allow_delete,
            }
    }
}

/// The command a chord triggers under the current configuration, if any.
pub fn resolve_command(chord: &KeyChord, config: &KeyboardConfig, selection_enabled: bool) -> Option<Command> {
    if !selection_enabled {
        return None;
    }
    Command::from_chord(chord).filter(|c| config.allows(c.category()))
}
