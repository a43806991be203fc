//! Projectiles
//!
//! A bullet is launched from the player's position, pushed forward along the
//! player's facing, and then flies straight at a fixed speed. It despawns
//! after its lifetime if it has one.

use crate::foundation::math::Vec3;
use crate::scene::entity::{Body, EntityEvent};
use serde::{Deserialize, Serialize};

/// Bullet tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletSettings {
    /// Flight speed
    pub speed: f32,
    /// Distance ahead of the shooter at which the bullet appears
    pub spawn_offset: f32,
    /// Seconds before despawning; `None` flies forever
    pub lifetime: Option<f32>,
    /// Uniform scale applied to the bullet mesh
    pub scale: f32,
    /// Registry name of the bullet mesh
    pub mesh: String,
    /// Registry name of the bullet material
    pub material: String,
}

impl Default for BulletSettings {
    fn default() -> Self {
        Self {
            speed: 15.0,
            spawn_offset: 1.0,
            lifetime: Some(3.0),
            scale: 0.25,
            mesh: "Sphere_Mesh".to_string(),
            material: "Snow_Material".to_string(),
        }
    }
}

/// Bullet variant state
#[derive(Debug, Clone, PartialEq)]
pub struct BulletState {
    age: f32,
    lifetime: Option<f32>,
}

impl BulletState {
    /// Fresh bullet
    pub fn new(lifetime: Option<f32>) -> Self {
        Self { age: 0.0, lifetime }
    }

    /// Place `body` ahead of `origin` along `direction` and set its speed
    pub fn launch(body: &mut Body, origin: &Vec3, direction: &Vec3, settings: &BulletSettings) {
        body.set_direction(*direction);
        let heading = body.direction();
        body.set_position(origin + heading * settings.spawn_offset);
        body.set_max_speed(settings.speed);
        body.set_velocity(heading * settings.speed);
    }

    /// Seconds since launch
    pub fn age(&self) -> f32 {
        self.age
    }

    pub(crate) fn update(&mut self, body: &mut Body, dt: f32) -> EntityEvent {
        body.set_velocity(body.direction() * body.max_speed());
        body.integrate_velocity(dt);

        self.age += dt;
        match self.lifetime {
            Some(lifetime) if self.age >= lifetime => EntityEvent::Expired,
            _ => EntityEvent::Idle,
        }
    }
}
