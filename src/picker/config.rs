use crate::hit_test::HitTestConfig;
use crate::input::Key;
use crate::selection::{FirstClassToken, SiblingPolicy};
use serde::{Deserialize, Serialize};

/// Keys the picker reacts to while active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyBindings {
    pub accept: Key,
    pub cancel: Key,
    /// Move the current node one ancestor up
    pub level_up: Key,
    /// Move the current node one descendant down
    pub level_down: Key,
    pub select_siblings: Key,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            accept: Key::Enter,
            cancel: Key::Escape,
            level_up: Key::ArrowUp,
            level_down: Key::ArrowDown,
            select_siblings: Key::Char('s'),
        }
    }
}

/// Picker configuration
#[derive(Debug)]
pub struct PickerConfig {
    pub hit_test: HitTestConfig,
    pub keys: KeyBindings,
    pub sibling_policy: Box<dyn SiblingPolicy>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            hit_test: HitTestConfig::default(),
            keys: KeyBindings::default(),
            sibling_policy: Box::new(FirstClassToken),
        }
    }
}

impl PickerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the hit-testing policy
    pub fn hit_test(mut self, hit_test: HitTestConfig) -> Self {
        self.hit_test = hit_test;
        self
    }

    /// Builder method: set the key bindings
    pub fn keys(mut self, keys: KeyBindings) -> Self {
        self.keys = keys;
        self
    }

    /// Builder method: set how sibling groups are matched
    pub fn sibling_policy(mut self, policy: impl SiblingPolicy + 'static) -> Self {
        self.sibling_policy = Box::new(policy);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::TagOnly;

    #[test]
    fn test_default_bindings() {
        let keys = KeyBindings::default();
        assert_eq!(keys.accept, Key::Enter);
        assert_eq!(keys.cancel, Key::Escape);
        assert_eq!(keys.select_siblings, Key::Char('s'));
    }

    #[test]
    fn test_partial_bindings_from_settings() {
        let keys: KeyBindings = serde_json::from_str(r#"{"selectSiblings": {"Char": "g"}}"#).unwrap();
        assert_eq!(keys.select_siblings, Key::Char('g'));
        assert_eq!(keys.level_up, Key::ArrowUp);
    }

    #[test]
    fn test_builder() {
        let config = PickerConfig::new().hit_test(HitTestConfig::default().min_size(4.0)).sibling_policy(TagOnly);
        assert_eq!(config.hit_test.min_size, 4.0);
        assert!(format!("{:?}", config.sibling_policy).contains("TagOnly"));
    }
}
