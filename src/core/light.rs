use glam::{Mat4, Vec3};

use super::camera::clamp_pitch;

/// A point light orbiting the same pivot as the camera.
///
/// Only the angles are live; the radius is chosen once from the mesh size.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitLight {
    /// Degrees about world up.
    pub yaw: f32,
    /// Degrees above the horizontal plane, clamped like the camera pitch.
    pitch: f32,
    distance: f32,
}

impl OrbitLight {
    pub const DEFAULT_YAW: f32 = 45.0;
    pub const DEFAULT_PITCH: f32 = 30.0;

    pub fn new(distance: f32) -> Self {
        Self {
            yaw: Self::DEFAULT_YAW,
            pitch: Self::DEFAULT_PITCH,
            distance,
        }
    }

    /// Radius that keeps the light just outside a mesh of the given extent.
    pub fn for_extent(max_extent: f32) -> Self {
        Self::new(max_extent.max(1.0) * 1.5)
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw += yaw_delta;
        self.pitch = clamp_pitch(self.pitch + pitch_delta);
    }

    /// Offset from the pivot, from the spherical angles.
    pub fn offset(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.distance * Vec3::new(pitch.cos() * yaw.sin(), pitch.sin(), pitch.cos() * yaw.cos())
    }

    /// Light position in the mesh's own coordinates.
    pub fn object_position(&self, center: Vec3) -> Vec3 {
        center + self.offset()
    }

    /// Light position after the same model-view transform the mesh gets.
    pub fn view_position(&self, center: Vec3, model_view: Mat4) -> Vec3 {
        model_view.transform_point3(self.object_position(center))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::camera::MAX_PITCH;
    use approx::assert_relative_eq;

    #[test]
    fn zero_angles_sit_on_positive_z() {
        let mut light = OrbitLight::new(3.0);
        light.rotate(-OrbitLight::DEFAULT_YAW, -OrbitLight::DEFAULT_PITCH);

        let p = light.object_position(Vec3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.z, 4.0, epsilon = 1e-6);
    }

    #[test]
    fn radius_is_constant() {
        let mut light = OrbitLight::for_extent(2.0);
        for _ in 0..20 {
            light.rotate(37.0, 11.0);
            assert_relative_eq!(light.offset().length(), 3.0, epsilon = 1e-5);
            assert!(light.pitch() <= MAX_PITCH);
        }
    }

    #[test]
    fn small_meshes_still_get_clearance() {
        assert_relative_eq!(OrbitLight::for_extent(0.01).distance(), 1.5);
    }

    #[test]
    fn view_position_follows_model_view() {
        let light = OrbitLight::new(2.0);
        let center = Vec3::new(0.0, 5.0, 0.0);
        let model_view = Mat4::from_translation(Vec3::new(0.0, -5.0, -10.0));

        let view = light.view_position(center, model_view);
        let expected = light.offset() + Vec3::new(0.0, 0.0, -10.0);
        assert_relative_eq!(view.x, expected.x, epsilon = 1e-5);
        assert_relative_eq!(view.y, expected.y, epsilon = 1e-5);
        assert_relative_eq!(view.z, expected.z, epsilon = 1e-5);
    }
}
