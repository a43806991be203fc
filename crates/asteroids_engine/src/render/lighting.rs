//! Directional lighting
//!
//! Lights are plain `#[repr(C)]` records uploaded as one byte blob named
//! `lights` to every entity's pixel shader.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Number of lights the entity pixel shader expects
pub const MAX_LIGHTS: usize = 4;

/// A directional light as laid out in the pixel shader's constant buffer
///
/// The trailing pad keeps each light on a 16-byte boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// Ambient color (RGBA)
    pub ambient_color: [f32; 4],
    /// Diffuse color (RGBA)
    pub diffuse_color: [f32; 4],
    /// Direction the light travels
    pub direction: [f32; 3],
    #[serde(skip)]
    padding: f32,
}

impl DirectionalLight {
    /// Create a light
    pub fn new(ambient_color: [f32; 4], diffuse_color: [f32; 4], direction: [f32; 3]) -> Self {
        Self {
            ambient_color,
            diffuse_color,
            direction,
            padding: 0.0,
        }
    }

    /// Four-light rig used by the game scene
    pub fn default_rig() -> [Self; MAX_LIGHTS] {
        let ambient = [0.1, 0.1, 0.1, 1.0];
        [
            Self::new(ambient, [0.8, 0.8, 0.8, 1.0], [1.0, -1.0, 0.0]),
            Self::new(ambient, [0.8, 0.8, 0.8, 1.0], [-1.0, -1.0, 0.0]),
            Self::new(ambient, [0.4, 0.4, 0.6, 1.0], [0.0, -1.0, 1.0]),
            Self::new(ambient, [0.4, 0.4, 0.6, 1.0], [0.0, 1.0, -1.0]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<DirectionalLight>(), 48);
        let rig = DirectionalLight::default_rig();
        assert_eq!(bytemuck::cast_slice::<_, u8>(&rig).len(), 48 * MAX_LIGHTS);
    }
}
