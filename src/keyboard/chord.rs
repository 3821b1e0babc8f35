//! Toolkit-independent key chords, plus translation from egui input.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Delete,
    Backspace,
    C,
    X,
    V,
    D,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    /// Ctrl on Windows/Linux, Cmd on macOS.
    pub command: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        command: false,
        alt: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        command: false,
        alt: false,
    };
    pub const COMMAND: Modifiers = Modifiers {
        shift: false,
        command: true,
        alt: false,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyChord {
    pub const fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub const fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }
}

#[cfg(feature = "egui")]
impl KeyChord {
    /// Translate an egui key press. Keys the builder does not bind give `None`.
    pub fn from_egui(key: egui::Key, modifiers: egui::Modifiers) -> Option<Self> {
        let key = match key {
            egui::Key::Escape => Key::Escape,
            egui::Key::Enter => Key::Enter,
            egui::Key::Tab => Key::Tab,
            egui::Key::ArrowUp => Key::ArrowUp,
            egui::Key::ArrowDown => Key::ArrowDown,
            egui::Key::ArrowLeft => Key::ArrowLeft,
            egui::Key::ArrowRight => Key::ArrowRight,
            egui::Key::Delete => Key::Delete,
            egui::Key::Backspace => Key::Backspace,
            egui::Key::C => Key::C,
            egui::Key::X => Key::X,
            egui::Key::V => Key::V,
            egui::Key::D => Key::D,
            _ => return None,
        };
        Some(Self::new(
            key,
            Modifiers {
                shift: modifiers.shift,
                command: modifiers.command || modifiers.ctrl || modifiers.mac_cmd,
                alt: modifiers.alt,
            },
        ))
    }
}

/// Chords pressed this frame. Clipboard events (which some integrations
/// send instead of the key press) map to their Ctrl/Cmd chord; duplicates
/// within one frame are dropped.
#[cfg(feature = "egui")]
pub fn chords_from_egui_input(input: &egui::InputState) -> Vec<KeyChord> {
    let mut out: Vec<KeyChord> = Vec::new();
    for event in &input.events {
        let chord = match event {
            egui::Event::Key {
                key,
                pressed: true,
                modifiers,
                ..
            } => KeyChord::from_egui(*key, *modifiers),
            egui::Event::Copy => Some(KeyChord::new(Key::C, Modifiers::COMMAND)),
            egui::Event::Cut => Some(KeyChord::new(Key::X, Modifiers::COMMAND)),
            egui::Event::Paste(_) => Some(KeyChord::new(Key::V, Modifiers::COMMAND)),
            _ => None,
        };
        if let Some(chord) = chord {
            if !out.contains(&chord) {
                out.push(chord);
            }
        }
    }
    out
}
