//! Drifting asteroids
//!
//! An asteroid spawns somewhere in a ring around the origin, picks a random
//! heading on the XZ plane and a speed in `[1, max_speed]`, and drifts at that
//! constant velocity forever while tumbling slowly.

use crate::foundation::math::{constants, planar_direction, Vec3};
use crate::scene::entity::{Body, EntityEvent};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Asteroid tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsteroidSettings {
    /// Upper bound of the drift speed
    pub max_speed: f32,
    /// Inner radius of the spawn ring
    pub min_spawn_distance: f32,
    /// Outer radius of the spawn ring
    pub max_spawn_distance: f32,
    /// Upper bound of the tumble rate on each axis, radians per second
    pub max_spin: f32,
}

impl Default for AsteroidSettings {
    fn default() -> Self {
        Self {
            max_speed: 3.0,
            min_spawn_distance: 8.0,
            max_spawn_distance: 20.0,
            max_spin: 0.5,
        }
    }
}

/// Asteroid variant state
#[derive(Debug, Clone, PartialEq)]
pub struct AsteroidState {
    spin: Vec3,
}

impl AsteroidState {
    /// Place `body` in the spawn ring and give it a random drift
    pub fn spawn<R: Rng + ?Sized>(body: &mut Body, settings: &AsteroidSettings, rng: &mut R) -> Self {
        let outer = settings.max_spawn_distance.max(settings.min_spawn_distance);
        let inner = settings.min_spawn_distance.min(outer).max(0.0);

        // uniform over the ring's area rather than its radius
        let radius = (inner * inner + rng.gen::<f32>() * (outer * outer - inner * inner)).sqrt();
        let placement = planar_direction(rng.gen::<f32>() * constants::TAU);
        body.set_position(placement * radius);

        let heading = planar_direction(rng.gen::<f32>() * constants::TAU);
        let speed = 1.0 + rng.gen::<f32>() * (settings.max_speed - 1.0).max(0.0);
        body.set_max_speed(settings.max_speed);
        body.set_direction(heading);
        body.set_velocity(heading * speed);

        let spin = settings.max_spin;
        Self {
            spin: Vec3::new(
                rng.gen::<f32>() * 2.0 * spin - spin,
                rng.gen::<f32>() * 2.0 * spin - spin,
                rng.gen::<f32>() * 2.0 * spin - spin,
            ),
        }
    }

    /// Asteroid with no tumble; the body keeps whatever motion it has
    pub fn still() -> Self {
        Self { spin: Vec3::zeros() }
    }

    /// Tumble rate
    pub fn spin(&self) -> Vec3 {
        self.spin
    }

    pub(crate) fn update(&mut self, body: &mut Body, dt: f32) -> EntityEvent {
        body.integrate_velocity(dt);
        if self.spin != Vec3::zeros() {
            body.rotate_by(&(self.spin * dt));
        }
        EntityEvent::Idle
    }
}
