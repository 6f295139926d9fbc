//! Light sources placed on the stage.
//!
//! Shadow flags are carried for completeness; the mesh pass shades with
//! plain Lambert terms and does not render shadow maps.

use glam::Vec3;

use crate::config::hex_to_linear;

/// Cone light aimed at a separately animated target point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotLight {
    pub color: [f32; 4],
    pub intensity: f32,
    /// Range beyond which the light contributes nothing.
    pub distance: f32,
    /// Half-angle of the cone in radians.
    pub angle: f32,
    /// Fraction of the cone that fades out towards the edge.
    pub penumbra: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub cast_shadow: bool,
}

impl SpotLight {
    /// The desk lamp.
    pub fn desk() -> Self {
        Self {
            color: hex_to_linear(0xffffff),
            intensity: 1.0,
            distance: 1.5,
            angle: std::f32::consts::PI / 7.0,
            penumbra: 0.3,
            position: Vec3::new(-0.28, 0.57, 0.21),
            target: Vec3::new(-0.13, -0.18, -0.21),
            cast_shadow: true,
        }
    }

    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Y)
    }
}

/// Parallel light shining from `position` towards `target`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub color: [f32; 4],
    pub intensity: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub cast_shadow: bool,
}

impl DirectionalLight {
    /// Cool moonlight through the window.
    pub fn moon() -> Self {
        Self {
            color: hex_to_linear(0xdcdfff),
            intensity: 2.0,
            position: Vec3::new(-1.793, 0.703, 0.599),
            target: Vec3::new(0.651, 0.365, 1.248),
            cast_shadow: true,
        }
    }

    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Y)
    }
}

/// Uniform light added to every surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    pub color: [f32; 4],
    pub intensity: f32,
}

impl AmbientLight {
    /// The pale blue fill that matches the moon light.
    pub fn moonlit() -> Self {
        Self {
            color: hex_to_linear(0xdcdfff),
            intensity: 0.5,
        }
    }
}

/// Omni light with a finite range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub color: [f32; 4],
    pub intensity: f32,
    pub distance: f32,
    pub position: Vec3,
}

impl PointLight {
    /// Mailbox light, parked far away until the last section brings it in.
    pub fn mailbox() -> Self {
        Self {
            color: hex_to_linear(0xdcdfff),
            intensity: 0.25,
            distance: 3.0,
            position: Vec3::new(50.0, 50.0, 50.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn spot_points_at_its_target() {
        let spot = SpotLight::desk();
        let dir = spot.direction();
        assert_abs_diff_eq!(dir.length(), 1.0, epsilon = 1e-5);
        assert!(dir.y < 0.0);
    }

    #[test]
    fn degenerate_direction_falls_back_downwards() {
        let mut moon = DirectionalLight::moon();
        moon.target = moon.position;
        assert_eq!(moon.direction(), Vec3::NEG_Y);
    }
}
