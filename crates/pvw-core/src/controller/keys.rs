//! Key bindings.
//!
//! Built once at startup and handed to the controller and presenter; never
//! mutated afterwards.

use ftui::{KeyCode, KeyEvent, Modifiers};

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Up,
    Down,
    Terminate,
    Refresh,
    Help,
    Quit,
}

/// One action's keys plus its help text.
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub keys: Vec<KeyEvent>,
    /// Key label shown in help, e.g. `↑/k`.
    pub label: String,
    pub description: String,
}

impl KeyBinding {
    pub fn new(keys: Vec<KeyEvent>, label: &str, description: &str) -> Self {
        Self {
            keys,
            label: label.to_string(),
            description: description.to_string(),
        }
    }

    /// Whether `key` is one of this binding's keys.
    ///
    /// Event kind is ignored. An extra SHIFT bit is tolerated because many
    /// terminals report it for characters like `?`.
    pub fn matches(&self, key: &KeyEvent) -> bool {
        self.keys.iter().any(|b| {
            b.code == key.code
                && (key.modifiers == b.modifiers || key.modifiers == (b.modifiers | Modifiers::SHIFT))
        })
    }
}

/// Complete key map.
#[derive(Debug, Clone)]
pub struct KeyMap {
    pub up: KeyBinding,
    pub down: KeyBinding,
    pub terminate: KeyBinding,
    pub refresh: KeyBinding,
    pub help: KeyBinding,
    pub quit: KeyBinding,
}

fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c))
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            up: KeyBinding::new(vec![KeyEvent::new(KeyCode::Up), key('k')], "↑/k", "move up"),
            down: KeyBinding::new(
                vec![KeyEvent::new(KeyCode::Down), key('j')],
                "↓/j",
                "move down",
            ),
            terminate: KeyBinding::new(vec![key('t')], "t", "terminate selected process"),
            refresh: KeyBinding::new(vec![key('r')], "r", "refresh the list of processes"),
            help: KeyBinding::new(vec![key('?')], "?", "toggle help"),
            quit: KeyBinding::new(
                vec![key('q'), key('c').with_modifiers(Modifiers::CTRL)],
                "q",
                "quit",
            ),
        }
    }
}

impl KeyMap {
    /// Resolve a key event to its action.
    pub fn action_for(&self, key: &KeyEvent) -> Option<KeyAction> {
        [
            (&self.up, KeyAction::Up),
            (&self.down, KeyAction::Down),
            (&self.terminate, KeyAction::Terminate),
            (&self.refresh, KeyAction::Refresh),
            (&self.help, KeyAction::Help),
            (&self.quit, KeyAction::Quit),
        ]
        .into_iter()
        .find(|(binding, _)| binding.matches(key))
        .map(|(_, action)| action)
    }

    /// Bindings for the one-line help.
    pub fn short_help(&self) -> Vec<&KeyBinding> {
        vec![&self.help, &self.quit]
    }

    /// Bindings for the expanded help, in columns.
    pub fn full_help(&self) -> Vec<Vec<&KeyBinding>> {
        vec![
            vec![&self.up, &self.down],
            vec![&self.refresh, &self.help],
            vec![&self.terminate, &self.quit],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_resolve() {
        let keys = KeyMap::default();
        assert_eq!(keys.action_for(&key('k')), Some(KeyAction::Up));
        assert_eq!(
            keys.action_for(&KeyEvent::new(KeyCode::Up)),
            Some(KeyAction::Up)
        );
        assert_eq!(keys.action_for(&key('j')), Some(KeyAction::Down));
        assert_eq!(
            keys.action_for(&KeyEvent::new(KeyCode::Down)),
            Some(KeyAction::Down)
        );
        assert_eq!(keys.action_for(&key('t')), Some(KeyAction::Terminate));
        assert_eq!(keys.action_for(&key('r')), Some(KeyAction::Refresh));
        assert_eq!(keys.action_for(&key('?')), Some(KeyAction::Help));
        assert_eq!(
            keys.action_for(&key('c').with_modifiers(Modifiers::CTRL)),
            Some(KeyAction::Quit)
        );
        assert_eq!(keys.action_for(&key('x')), None);
    }

    #[test]
    fn plain_c_is_not_quit() {
        assert_eq!(KeyMap::default().action_for(&key('c')), None);
    }

    #[test]
    fn shifted_question_mark_still_toggles_help() {
        let shifted = key('?').with_modifiers(Modifiers::SHIFT);
        assert_eq!(KeyMap::default().action_for(&shifted), Some(KeyAction::Help));
    }

    #[test]
    fn help_layouts() {
        let keys = KeyMap::default();
        let short: Vec<_> = keys.short_help().iter().map(|b| b.label.as_str()).collect();
        assert_eq!(short, vec!["?", "q"]);
        let full = keys.full_help();
        assert_eq!(full.len(), 3);
        assert!(full.iter().flatten().any(|b| b.label == "t"));
    }
}
