//! # Follow Camera
//!
//! Perspective camera that produces the view and projection matrices handed
//! to every entity and emitter draw. In play it trails the player ship from
//! above and behind.
//!
//! Uses a right-handed Y-up view space; the play field is the XZ plane.

use crate::foundation::math::{utils, Mat4, Vec3};
use nalgebra::Point3;

/// 3D perspective camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    /// Vertical field of view in radians
    pub fov: f32,

    /// Aspect ratio (width / height)
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a new perspective camera looking at the origin
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Viewport width / height
    /// * `near` - Near plane distance (must be > 0)
    /// * `far` - Far plane distance (must be > near)
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Update camera position in world space
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Update the look-at point
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Update aspect ratio for a resized viewport
    ///
    /// Non-positive values are ignored.
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if aspect <= 0.0 {
            log::warn!("Ignoring invalid aspect ratio {}", aspect);
            return;
        }
        if (self.aspect - aspect).abs() > 0.01 {
            log::info!("Camera aspect ratio changed: {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.aspect = aspect;
    }

    /// Trail a subject: sit at `subject + offset` and look at the subject
    pub fn follow(&mut self, subject: &Vec3, offset: &Vec3) {
        self.position = subject + offset;
        self.target = *subject;
    }

    /// World-to-view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(
            &Point3::from(self.position),
            &Point3::from(self.target),
            &self.up,
        )
    }

    /// View-to-clip perspective matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(Vec3::new(0.0, 0.0, -5.0), 45.0, 16.0 / 9.0, 0.1, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_view_maps_target_onto_negative_z_axis() {
        let mut camera = Camera::default();
        camera.follow(&Vec3::new(3.0, 0.0, 4.0), &Vec3::new(0.0, 10.0, -6.0));

        let target = camera.view_matrix().transform_point(&Point3::new(3.0, 0.0, 4.0));
        assert_relative_eq!(target.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(target.y, 0.0, epsilon = 1e-5);
        assert!(target.z < 0.0);
    }

    #[test]
    fn test_follow_keeps_offset() {
        let mut camera = Camera::default();
        let offset = Vec3::new(0.0, 12.0, -8.0);
        camera.follow(&Vec3::new(-2.0, 0.0, 5.0), &offset);
        assert_relative_eq!(camera.position - camera.target, offset);
    }

    #[test]
    fn test_invalid_aspect_is_ignored() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(0.0);
        assert_relative_eq!(camera.aspect, 16.0 / 9.0);
        camera.set_aspect_ratio(4.0 / 3.0);
        assert_relative_eq!(camera.aspect, 4.0 / 3.0);
    }
}
