//! Perspective camera with an Euler-angle orientation.
//!
//! The choreography animates camera position and rotation channels directly,
//! so orientation is stored as XYZ Euler angles like every other transform.

use glam::{EulerRot, Mat4, Quat, Vec3};

/// A perspective camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Rotation in radians, XYZ order. Identity looks down -Z.
    pub rotation: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            rotation: Vec3::ZERO,
            fov: 45.0,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place the camera at `position`.
    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Vertical field of view in degrees.
    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees;
        self
    }

    /// Near and far clip distances.
    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    /// Orient the camera so it faces `target`.
    pub fn looking_at(mut self, target: Vec3) -> Self {
        self.look_at(target);
        self
    }

    /// Orient the camera so it faces `target`, keeping +Y up.
    pub fn look_at(&mut self, target: Vec3) {
        let view = Mat4::look_at_rh(self.position, target, Vec3::Y);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
        self.rotation = Vec3::new(x, y, z);
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Unit vector the camera is looking along.
    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::NEG_Z
    }

    /// World-to-camera matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation(), self.position).inverse()
    }

    /// Camera-to-clip matrix with a 0..1 depth range.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect.max(1e-4), self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn identity_rotation_looks_down_negative_z() {
        let cam = Camera::new();
        assert_abs_diff_eq!(cam.forward().z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn look_at_points_forward_at_target() {
        let cam = Camera::new().at(Vec3::new(5.0, 5.0, 5.0)).looking_at(Vec3::ZERO);
        let expected = (Vec3::ZERO - cam.position).normalize();
        let fwd = cam.forward();
        assert_abs_diff_eq!(fwd.x, expected.x, epsilon = 1e-4);
        assert_abs_diff_eq!(fwd.y, expected.y, epsilon = 1e-4);
        assert_abs_diff_eq!(fwd.z, expected.z, epsilon = 1e-4);
    }

    #[test]
    fn pitch_down_tilts_forward_below_horizon() {
        let mut cam = Camera::new();
        cam.rotation.x = -std::f32::consts::PI / 12.0;
        assert!(cam.forward().y < 0.0);
    }

    #[test]
    fn view_matrix_maps_camera_to_origin() {
        let cam = Camera::new().at(Vec3::new(0.0, 0.7, 1.75));
        let p = cam.view_matrix().transform_point3(cam.position);
        assert_abs_diff_eq!(p.length(), 0.0, epsilon = 1e-5);
    }
}
