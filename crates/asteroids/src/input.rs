//! Scripted input for headless runs

use asteroids_engine::input::{InputSource, KeyCode};
use serde::{Deserialize, Serialize};

/// A key held over a span of game time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptedKey {
    /// Key to hold
    pub key: KeyCode,
    /// Seconds at which the key goes down
    pub start: f32,
    /// Seconds at which the key comes back up
    pub end: f32,
}

/// Input source that replays a [`ScriptedKey`] timeline
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    script: Vec<ScriptedKey>,
    time: f32,
}

impl ScriptedInput {
    /// Create from a timeline
    pub fn new(script: Vec<ScriptedKey>) -> Self {
        Self { script, time: 0.0 }
    }

    /// Move the playhead
    pub fn set_time(&mut self, time: f32) {
        self.time = time;
    }
}

impl InputSource for ScriptedInput {
    fn is_key_down(&self, key: KeyCode) -> bool {
        self.script
            .iter()
            .any(|entry| entry.key == key && entry.start <= self.time && self.time < entry.end)
    }
}
