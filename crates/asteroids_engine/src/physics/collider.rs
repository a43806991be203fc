//! Circle collider attached to every entity

use serde::{Deserialize, Serialize};

/// Circular overlap-test volume on the XZ plane
///
/// A negative radius marks a collider that was never initialized. A collider
/// that is disabled, or whose radius is not positive, never overlaps anything.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    radius: f32,
    enabled: bool,
}

impl Default for Collider {
    fn default() -> Self {
        Self {
            radius: -1.0,
            enabled: true,
        }
    }
}

impl Collider {
    /// Create an enabled collider with the given radius
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            enabled: true,
        }
    }

    /// Collider radius in world units
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Set the collider radius
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    /// Whether the collider is enabled
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the collider
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether this collider can take part in overlap tests
    pub fn is_active(&self) -> bool {
        self.enabled && self.radius > 0.0
    }

    /// Multiply the current radius by `factor`
    ///
    /// Uninitialized radii stay uninitialized.
    pub fn scale_radius(&mut self, factor: f32) {
        if self.radius > 0.0 {
            self.radius *= factor;
        }
    }
}
