//! Keyboard input collaborator
//!
//! Input is polled, never queued: entity updates ask "is key K down right
//! now" through [`InputSource`] at the top of their update.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    /// W key (thrust)
    W,
    /// A key (turn left)
    A,
    /// S key (reverse thrust)
    S,
    /// D key (turn right)
    D,
    /// R key (restart)
    R,
    /// Space key (fire)
    Space,
    /// Enter key (start)
    Enter,
    /// Escape key (quit)
    Escape,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Left arrow
    Left,
    /// Right arrow
    Right,
}

/// Synchronous "is key down" poll
pub trait InputSource {
    /// Whether `key` is currently held
    fn is_key_down(&self, key: KeyCode) -> bool;

    /// Whether any of `keys` is currently held
    fn any_down(&self, keys: &[KeyCode]) -> bool {
        keys.iter().any(|&key| self.is_key_down(key))
    }
}

/// Set of currently held keys, fed by a window's key events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardState {
    pressed: HashSet<KeyCode>,
}

impl KeyboardState {
    /// Create a state with nothing held
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press or release
    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.pressed.insert(key);
        } else {
            self.pressed.remove(&key);
        }
    }

    /// Release every key
    pub fn clear(&mut self) {
        self.pressed.clear();
    }
}

impl InputSource for KeyboardState {
    fn is_key_down(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }
}

/// Input source with nothing ever held
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn is_key_down(&self, _key: KeyCode) -> bool {
        false
    }
}
