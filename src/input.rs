//! Input events delivered by the host to the picker and the harvester.

use serde::{Deserialize, Serialize};

/// Modifier keys held during an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { shift: false, ctrl: false, alt: false, meta: false };
    pub const CTRL: Modifiers = Modifiers { shift: false, ctrl: true, alt: false, meta: false };
    pub const SHIFT: Modifiers = Modifiers { shift: true, ctrl: false, alt: false, meta: false };

    /// Modifier that turns a click into a toggle and a wheel turn into a level step
    pub fn is_held(&self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// Keys the picker and harvester care about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Enter,
    Escape,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Char(char),
}

impl Key {
    /// Parse a DOM `KeyboardEvent.key` value
    pub fn from_dom(key: &str) -> Option<Key> {
        match key {
            "Enter" => Some(Key::Enter),
            "Escape" | "Esc" => Some(Key::Escape),
            "ArrowUp" => Some(Key::ArrowUp),
            "ArrowDown" => Some(Key::ArrowDown),
            "ArrowLeft" => Some(Key::ArrowLeft),
            "ArrowRight" => Some(Key::ArrowRight),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Key::Char(c.to_ascii_lowercase())),
                    _ => None,
                }
            }
        }
    }
}

/// A pointer, keyboard or wheel event in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    PointerMove { x: f64, y: f64 },
    PointerDown { x: f64, y: f64, modifiers: Modifiers },
    Key { key: Key, modifiers: Modifiers },
    Wheel { x: f64, y: f64, delta_y: f64, modifiers: Modifiers },
}

/// Whether a handler swallowed the event or the page should still see it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    Consumed,
    PassThrough,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_dom() {
        assert_eq!(Key::from_dom("Escape"), Some(Key::Escape));
        assert_eq!(Key::from_dom("ArrowUp"), Some(Key::ArrowUp));
        assert_eq!(Key::from_dom("S"), Some(Key::Char('s')));
        assert_eq!(Key::from_dom("Shift"), None);
    }

    #[test]
    fn test_modifiers() {
        assert!(!Modifiers::NONE.is_held());
        assert!(Modifiers::CTRL.is_held());
        assert!(!Modifiers { alt: true, ..Default::default() }.is_held());
    }

    #[test]
    fn test_event_deserialization() {
        let event: InputEvent =
            serde_json::from_str(r#"{"type": "pointerDown", "x": 1, "y": 2, "modifiers": {"ctrl": true}}"#).unwrap();
        assert_eq!(event, InputEvent::PointerDown { x: 1.0, y: 2.0, modifiers: Modifiers::CTRL });
    }
}
