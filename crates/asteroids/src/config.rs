//! Game configuration
//!
//! Loaded from `config/game.toml` (or any `.toml` / `.ron` path given on the
//! command line). Every section and field is optional.

use asteroids_engine::assets::RegistrySettings;
use asteroids_engine::config::Config;
use asteroids_engine::physics::CollisionPolicy;
use asteroids_engine::render::EmitterSettings;
use asteroids_engine::scene::{AsteroidSettings, BulletSettings, PlayerSettings};
use serde::{Deserialize, Serialize};

use crate::input::ScriptedKey;

/// Game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Window settings
    pub window: WindowConfig,
    /// Gameplay tuning
    pub gameplay: GameplayConfig,
    /// Ship exhaust emitter
    pub exhaust: EmitterSettings,
    /// Bullet impact emitter
    pub explosion: EmitterSettings,
    /// Run loop settings
    pub run: RunConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            gameplay: GameplayConfig::default(),
            exhaust: EmitterSettings {
                max_particles: 200,
                particles_per_second: 20.0,
                lifetime: 0.5,
                start_size: 0.15,
                end_size: 0.05,
                start_color: [1.0, 0.7, 0.2, 1.0],
                end_color: [0.8, 0.1, 0.0, 0.0],
                velocity_jitter: 0.3,
                ..EmitterSettings::default()
            },
            explosion: EmitterSettings {
                max_particles: 300,
                particles_per_second: 0.0,
                lifetime: 0.8,
                start_size: 0.3,
                end_size: 0.05,
                start_color: [1.0, 0.9, 0.6, 1.0],
                end_color: [0.5, 0.2, 0.1, 0.0],
                explosion_speed: 6.0,
                ..EmitterSettings::default()
            },
            run: RunConfig::default(),
        }
    }
}

impl Config for GameConfig {}

/// Window configuration
///
/// Only the aspect ratio matters to the headless backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Asteroids".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

impl WindowConfig {
    /// Width over height, 1.0 for a degenerate window
    pub fn aspect_ratio(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Gameplay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Asteroids placed when a round starts
    pub asteroid_count: u32,
    /// Uniform scale of the player ship
    pub player_scale: f32,
    /// Player ship tuning
    pub player: PlayerSettings,
    /// Asteroid tuning
    pub asteroid: AsteroidSettings,
    /// Bullet tuning
    pub bullet: BulletSettings,
    /// How simultaneous collisions are resolved
    pub collision_policy: CollisionPolicy,
    /// Fixed seed for asteroid placement
    pub seed: Option<u64>,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            asteroid_count: 8,
            player_scale: 0.5,
            player: PlayerSettings::default(),
            asteroid: AsteroidSettings::default(),
            bullet: BulletSettings::default(),
            collision_policy: CollisionPolicy::default(),
            seed: None,
        }
    }
}

impl GameplayConfig {
    /// Registry settings for these gameplay values
    pub fn registry_settings(&self) -> RegistrySettings {
        RegistrySettings {
            player: self.player.clone(),
            asteroid: self.asteroid.clone(),
            bullet: self.bullet.clone(),
            collision_policy: self.collision_policy,
            seed: self.seed,
        }
    }
}

/// Run loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Frames to simulate before exiting
    pub frames: u32,
    /// Fixed simulation step in seconds
    pub timestep: f32,
    /// Default log level; `RUST_LOG` overrides it
    pub log_level: String,
    /// Scripted key presses fed to the game in place of a keyboard
    pub script: Vec<ScriptedKey>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            timestep: 1.0 / 60.0,
            log_level: "info".to_string(),
            script: Vec::new(),
        }
    }
}
