use glam::Vec3;
use winit::event::MouseButton;

use crate::camera::Camera;
use crate::input::Input;

/// Free-orbit controls with damping around a target point.
///
/// Dragging with the left mouse button feeds angular velocity; every update
/// applies a fraction of it and decays the rest, so the camera glides to a
/// stop. With pan enabled, dragging with the right button slides the target
/// across the view plane. Pan and zoom are off by default.
///
/// # Example
/// ```ignore
/// let mut orbit = OrbitControls::new(Camera::new().at(Vec3::splat(5.0)), Vec3::ZERO);
///
/// // Every frame:
/// orbit.update(&input, dt);
/// let camera = orbit.camera();
/// ```
#[derive(Clone, Debug)]
pub struct OrbitControls {
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Distance from target.
    pub distance: f32,
    /// Horizontal angle in radians.
    pub azimuth: f32,
    /// Vertical angle in radians, clamped short of the poles.
    pub elevation: f32,
    /// Radians per pixel of drag.
    pub sensitivity: f32,
    /// Fraction of the pending velocity applied per update. `None` applies it all at once.
    pub damping: Option<f32>,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    /// Scroll zoom sensitivity when zoom is enabled.
    pub zoom_sensitivity: f32,
    /// Target travel per pixel of right-drag, as a fraction of `distance`.
    pub pan_sensitivity: f32,
    velocity: (f32, f32),
    lens: Camera,
}

const ELEVATION_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

impl OrbitControls {
    /// Wrap `camera`, deriving the orbit from its current position.
    pub fn new(camera: Camera, target: Vec3) -> Self {
        let offset = camera.position - target;
        let distance = offset.length().max(1e-4);
        Self {
            target,
            distance,
            azimuth: offset.x.atan2(offset.z),
            elevation: (offset.y / distance).clamp(-1.0, 1.0).asin(),
            sensitivity: 0.005,
            damping: Some(0.05),
            enable_zoom: false,
            enable_pan: false,
            zoom_sensitivity: 0.5,
            pan_sensitivity: 0.002,
            velocity: (0.0, 0.0),
            lens: camera,
        }
    }

    /// Set the damping factor, clamped to `[0, 1]`. `None` disables gliding.
    pub fn damping(mut self, factor: Option<f32>) -> Self {
        self.damping = factor.map(|f| f.clamp(0.0, 1.0));
        self
    }

    /// Enable scroll-wheel zoom.
    pub fn zoom(mut self, enabled: bool) -> Self {
        self.enable_zoom = enabled;
        self
    }

    /// Enable right-drag panning.
    pub fn pan(mut self, enabled: bool) -> Self {
        self.enable_pan = enabled;
        self
    }

    /// Update the aspect ratio of the wrapped lens.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.lens.aspect = aspect;
    }

    /// Advance the controls by one frame.
    pub fn update(&mut self, input: &Input, _dt: f32) {
        if input.mouse_down(MouseButton::Left) {
            let delta = input.mouse_delta();
            self.velocity.0 -= delta.x * self.sensitivity;
            self.velocity.1 += delta.y * self.sensitivity;
        }

        if self.enable_pan && input.mouse_down(MouseButton::Right) {
            self.pan_by(input.mouse_delta());
        }

        if self.enable_zoom {
            let scroll = input.scroll_delta();
            if scroll.y.abs() > 0.0 {
                self.distance = (self.distance - scroll.y * self.zoom_sensitivity).max(0.1);
            }
        }

        match self.damping {
            Some(factor) => {
                self.azimuth += self.velocity.0 * factor;
                self.elevation += self.velocity.1 * factor;
                self.velocity.0 *= 1.0 - factor;
                self.velocity.1 *= 1.0 - factor;
            }
            None => {
                self.azimuth += self.velocity.0;
                self.elevation += self.velocity.1;
                self.velocity = (0.0, 0.0);
            }
        }
        self.elevation = self.elevation.clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
    }

    /// Current camera state.
    pub fn camera(&self) -> Camera {
        self.lens
            .at(self.target + self.offset())
            .looking_at(self.target)
    }

    fn offset(&self) -> Vec3 {
        Vec3::new(
            self.distance * self.elevation.cos() * self.azimuth.sin(),
            self.distance * self.elevation.sin(),
            self.distance * self.elevation.cos() * self.azimuth.cos(),
        )
    }

    /// Slide the target by a screen-space drag; the view direction is unchanged.
    fn pan_by(&mut self, drag: glam::Vec2) {
        let forward = -self.offset().normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        let scale = self.pan_sensitivity * self.distance;
        self.target += (up * drag.y - right * drag.x) * scale;
    }
}
