//! Player ship
//!
//! Thrust along the facing direction with acceleration, drag and a clamped
//! top speed; yaw from the turn keys; a fire request whenever the shot
//! cooldown has elapsed. The exhaust emitter trails the ship and its emission
//! rate follows the ship's speed.

use crate::foundation::math::{utils, Vec3};
use crate::input::KeyCode;
use crate::scene::entity::{Body, EntityEvent, UpdateContext};
use serde::{Deserialize, Serialize};

/// Player tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Top speed in units per second
    pub max_speed: f32,
    /// Thrust acceleration in units per second squared
    pub acceleration: f32,
    /// Deceleration applied while no thrust key is held
    pub drag: f32,
    /// Yaw rate in radians per second
    pub turn_rate: f32,
    /// Minimum seconds between shots
    pub shot_cooldown: f32,
    /// Distance behind the ship at which exhaust is emitted
    pub exhaust_offset: f32,
    /// Exhaust particles per second while idle
    pub exhaust_idle_rate: f32,
    /// Exhaust particles per second at top speed
    pub exhaust_full_rate: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            max_speed: 5.0,
            acceleration: 8.0,
            drag: 3.0,
            turn_rate: 3.0,
            shot_cooldown: 0.5,
            exhaust_offset: 1.0,
            exhaust_idle_rate: 5.0,
            exhaust_full_rate: 80.0,
        }
    }
}

/// Player variant state
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    settings: PlayerSettings,
    speed: f32,
    last_shot: Option<f32>,
    shots_fired: u32,
}

impl PlayerState {
    /// Fresh ship at rest
    pub fn new(settings: PlayerSettings) -> Self {
        Self {
            settings,
            speed: 0.0,
            last_shot: None,
            shots_fired: 0,
        }
    }

    /// Tuning in use
    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    /// Signed speed along the facing direction
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Number of shots fired so far
    pub fn shots_fired(&self) -> u32 {
        self.shots_fired
    }

    fn can_fire(&self, total_time: f32) -> bool {
        self.last_shot
            .map_or(true, |last| total_time - last >= self.settings.shot_cooldown)
    }

    pub(crate) fn update(&mut self, body: &mut Body, ctx: &mut UpdateContext<'_>) -> EntityEvent {
        let dt = ctx.delta_time;
        let input = ctx.input;
        let settings = &self.settings;

        let mut turn = 0.0;
        if input.any_down(&[KeyCode::A, KeyCode::Left]) {
            turn -= 1.0;
        }
        if input.any_down(&[KeyCode::D, KeyCode::Right]) {
            turn += 1.0;
        }
        if turn != 0.0 {
            body.rotate_by(&Vec3::new(0.0, turn * settings.turn_rate * dt, 0.0));
        }

        let mut thrust = 0.0;
        if input.any_down(&[KeyCode::W, KeyCode::Up]) {
            thrust += 1.0;
        }
        if input.any_down(&[KeyCode::S, KeyCode::Down]) {
            thrust -= 1.0;
        }
        self.speed = if thrust == 0.0 {
            utils::approach_zero(self.speed, settings.drag * dt)
        } else {
            self.speed + thrust * settings.acceleration * dt
        };
        self.speed = self.speed.clamp(-settings.max_speed, settings.max_speed);

        body.set_max_speed(settings.max_speed);
        body.set_direction(body.facing());
        body.set_velocity(body.direction() * self.speed);
        body.integrate_velocity(dt);

        if let Some(exhaust) = ctx.exhaust.as_deref_mut() {
            exhaust.set_emitter_position(body.position() - body.direction() * settings.exhaust_offset);
            exhaust.set_emitter_velocity(-body.velocity());
            let fraction = if settings.max_speed > 0.0 {
                self.speed.abs() / settings.max_speed
            } else {
                0.0
            };
            exhaust.set_particles_per_second(utils::lerp(
                settings.exhaust_idle_rate,
                settings.exhaust_full_rate,
                fraction,
            ));
        }

        if input.is_key_down(KeyCode::Space) && self.can_fire(ctx.total_time) {
            self.last_shot = Some(ctx.total_time);
            self.shots_fired += 1;
            log::debug!("Player fired shot {} at t={:.2}", self.shots_fired, ctx.total_time);
            return EntityEvent::Fire;
        }

        EntityEvent::Idle
    }
}
