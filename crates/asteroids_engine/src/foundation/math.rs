//! Math utilities and types
//!
//! Provides the fundamental math types for the simulation. The play field is
//! the XZ plane with Y up; rotations are stored as pitch (x), yaw (y) and
//! roll (z) Euler angles in radians.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type (also used for RGBA colors)
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Local forward axis of every entity before rotation
pub const FORWARD: Vec3 = Vec3::new(0.0, 0.0, 1.0);

/// Build a rotation from pitch/yaw/roll Euler angles
///
/// Roll is applied first, then pitch, then yaw.
pub fn rotation_from_euler(rotation: &Vec3) -> Quat {
    Quat::from_axis_angle(&Vec3::y_axis(), rotation.y)
        * Quat::from_axis_angle(&Vec3::x_axis(), rotation.x)
        * Quat::from_axis_angle(&Vec3::z_axis(), rotation.z)
}

/// Compose a world matrix from position, Euler rotation and scale
///
/// Points are scaled first, then rotated, then translated.
pub fn compose_world_matrix(position: &Vec3, rotation: &Vec3, scale: &Vec3) -> Mat4 {
    Mat4::new_translation(position)
        * rotation_from_euler(rotation).to_homogeneous()
        * Mat4::new_nonuniform_scaling(scale)
}

/// Euclidean distance between two points projected onto the XZ plane
pub fn planar_distance(a: &Vec3, b: &Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    dx.hypot(dz)
}

/// Unit vector on the XZ plane at `angle` radians from +X towards +Z
pub fn planar_direction(angle: f32) -> Vec3 {
    Vec3::new(angle.cos(), 0.0, angle.sin())
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Vec4};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Component-wise linear interpolation of two colors
    pub fn lerp_color(a: &Vec4, b: &Vec4, t: f32) -> Vec4 {
        a.lerp(b, t)
    }

    /// Move `value` towards zero by `amount` without overshooting
    pub fn approach_zero(value: f32, amount: f32) -> f32 {
        if value.abs() <= amount {
            0.0
        } else {
            value - amount * value.signum()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_yaw_rotates_forward_towards_x() {
        let rotation = rotation_from_euler(&Vec3::new(0.0, constants::PI / 2.0, 0.0));
        let forward = rotation * FORWARD;
        assert_relative_eq!(forward, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_world_matrix_scales_before_translating() {
        let world = compose_world_matrix(
            &Vec3::new(10.0, 0.0, -2.0),
            &Vec3::zeros(),
            &Vec3::new(2.0, 3.0, 4.0),
        );
        let point = world.transform_point(&nalgebra::Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(point.coords, Vec3::new(12.0, 3.0, 2.0), epsilon = 1e-6);
    }

    #[test]
    fn test_world_matrix_rotates_before_translating() {
        let world = compose_world_matrix(
            &Vec3::new(5.0, 0.0, 0.0),
            &Vec3::new(0.0, constants::PI / 2.0, 0.0),
            &Vec3::new(1.0, 1.0, 1.0),
        );
        let point = world.transform_point(&nalgebra::Point3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(point.coords, Vec3::new(6.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_planar_distance_ignores_height() {
        let a = Vec3::new(0.0, 100.0, 0.0);
        let b = Vec3::new(3.0, -50.0, 4.0);
        assert_relative_eq!(planar_distance(&a, &b), 5.0);
    }

    #[test]
    fn test_approach_zero_does_not_overshoot() {
        assert_relative_eq!(utils::approach_zero(0.5, 1.0), 0.0);
        assert_relative_eq!(utils::approach_zero(-3.0, 1.0), -2.0);
        assert_relative_eq!(utils::approach_zero(3.0, 1.0), 2.0);
    }
}
