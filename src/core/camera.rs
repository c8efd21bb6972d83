use std::fmt::{self, Display, Formatter};

use glam::{Mat3, Mat4, Vec2, Vec3};

/// Pitch is kept just short of straight up/down so the orbit never flips.
pub const MAX_PITCH: f32 = 89.0;
pub const MIN_CAMERA_DISTANCE: f32 = 0.1;
pub const FOV_Y_DEGREES: f32 = 45.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 500.0;
/// Half-height of the orthographic view box.
pub const ORTHO_HALF_SIZE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    #[default]
    Perspective,
    Orthographic,
}

impl ProjectionMode {
    pub fn toggle(&mut self) {
        *self = match self {
            ProjectionMode::Perspective => ProjectionMode::Orthographic,
            ProjectionMode::Orthographic => ProjectionMode::Perspective,
        };
    }
}

impl Display for ProjectionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionMode::Perspective => write!(f, "Perspective"),
            ProjectionMode::Orthographic => write!(f, "Orthographic"),
        }
    }
}

/// Orbit camera around a fixed pivot.
///
/// Nothing here is cached: every matrix is derived from the four orbit
/// parameters on demand, since input mutates them between every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// Rotation about world up, in degrees. Unbounded.
    pub yaw: f32,
    /// Rotation about the camera's right axis, in degrees, within `±MAX_PITCH`.
    pitch: f32,
    /// Distance from the pivot along the viewing axis.
    distance: f32,
    /// View-space offset applied after the orbit.
    pub pan: Vec2,
}

impl OrbitCamera {
    pub fn new(distance: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: distance.max(MIN_CAMERA_DISTANCE),
            pan: Vec2::ZERO,
        }
    }

    /// Distance that frames a mesh of the given largest extent.
    pub fn framing_distance(max_extent: f32) -> f32 {
        max_extent.max(1.0) * 2.5
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw += yaw_delta;
        self.set_pitch(self.pitch + pitch_delta);
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = clamp_pitch(pitch);
    }

    pub fn zoom(&mut self, delta: f32) {
        self.set_distance(self.distance + delta);
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.max(MIN_CAMERA_DISTANCE);
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Back to the default orientation. Distance is left alone.
    pub fn reset(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.pan = Vec2::ZERO;
    }

    /// Moves the mesh so `center` sits at the origin. Orthographic mode also
    /// scales by `1 / distance`, standing in for the shrink perspective gives
    /// when zooming out.
    pub fn model_matrix(&self, center: Vec3, projection: ProjectionMode) -> Mat4 {
        let translate = Mat4::from_translation(-center);
        match projection {
            ProjectionMode::Perspective => translate,
            ProjectionMode::Orthographic => {
                Mat4::from_scale(Vec3::splat(1.0 / self.distance)) * translate
            }
        }
    }

    /// Vertices get yaw, then pitch, then pushed back by `distance`, then panned.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.pan.extend(0.0))
            * Mat4::from_translation(Vec3::new(0.0, 0.0, -self.distance))
            * Mat4::from_rotation_x(self.pitch.to_radians())
            * Mat4::from_rotation_y(self.yaw.to_radians())
    }

    pub fn projection_matrix(&self, aspect: f32, projection: ProjectionMode) -> Mat4 {
        match projection {
            ProjectionMode::Perspective => {
                Mat4::perspective_rh_gl(FOV_Y_DEGREES.to_radians(), aspect, NEAR_PLANE, FAR_PLANE)
            }
            // near/far are passed as (-far, far) so geometry behind the eye
            // stays inside the depth range.
            ProjectionMode::Orthographic => Mat4::orthographic_rh_gl(
                -ORTHO_HALF_SIZE * aspect,
                ORTHO_HALF_SIZE * aspect,
                -ORTHO_HALF_SIZE,
                ORTHO_HALF_SIZE,
                -FAR_PLANE,
                FAR_PLANE,
            ),
        }
    }

    /// World-space height visible at the pivot.
    pub fn visible_height(&self, projection: ProjectionMode) -> f32 {
        match projection {
            ProjectionMode::Perspective => {
                2.0 * self.distance * (0.5 * FOV_Y_DEGREES.to_radians()).tan()
            }
            ProjectionMode::Orthographic => 2.0 * ORTHO_HALF_SIZE,
        }
    }

    /// World units per pixel of pointer travel, so a pan drag tracks the
    /// cursor at any zoom level.
    pub fn pan_scale(&self, projection: ProjectionMode, viewport_height: u32) -> f32 {
        if viewport_height == 0 {
            return 0.0;
        }
        self.visible_height(projection) / viewport_height as f32
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(4.0)
    }
}

pub fn clamp_pitch(pitch: f32) -> f32 {
    pitch.clamp(-MAX_PITCH, MAX_PITCH)
}

/// Inverse-transpose of the upper 3x3, for transforming normals through a
/// matrix that may scale non-uniformly.
pub fn normal_matrix(model_view: Mat4) -> Mat3 {
    Mat3::from_mat4(model_view).inverse().transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec4;

    fn assert_mat4_eq(a: Mat4, b: Mat4) {
        for (x, y) in a.to_cols_array().iter().zip(b.to_cols_array().iter()) {
            assert_relative_eq!(x, y, epsilon = 1e-5);
        }
    }

    #[test]
    fn pitch_stays_clamped() {
        let mut cam = OrbitCamera::new(5.0);
        for delta in [1.0e6, -3.0, -1.0e9, 45.0, 200.0, -0.5, f32::MAX] {
            cam.rotate(0.0, delta);
            assert!((-MAX_PITCH..=MAX_PITCH).contains(&cam.pitch()));
        }
        cam.rotate(0.0, 500.0);
        assert_eq!(cam.pitch(), MAX_PITCH);
        cam.rotate(0.0, -500.0);
        assert_eq!(cam.pitch(), -MAX_PITCH);
    }

    #[test]
    fn clamp_is_idempotent() {
        for p in [-120.0, -89.0, -10.0, 0.0, 33.3, 89.0, 4000.0] {
            assert_eq!(clamp_pitch(clamp_pitch(p)), clamp_pitch(p));
        }
    }

    #[test]
    fn zoom_stops_at_minimum() {
        let mut cam = OrbitCamera::new(1.0);
        cam.zoom(-0.5);
        assert_relative_eq!(cam.distance(), 0.5);
        cam.zoom(-100.0);
        assert_eq!(cam.distance(), MIN_CAMERA_DISTANCE);
        cam.zoom(-1.0);
        assert_eq!(cam.distance(), MIN_CAMERA_DISTANCE);
        cam.zoom(2.0);
        assert!(cam.distance() > MIN_CAMERA_DISTANCE);
    }

    #[test]
    fn reset_keeps_distance() {
        let mut cam = OrbitCamera::new(7.0);
        cam.rotate(33.0, -12.0);
        cam.pan_by(Vec2::new(0.4, -1.2));
        cam.zoom(3.0);

        cam.reset();

        assert_eq!(cam.yaw, 0.0);
        assert_eq!(cam.pitch(), 0.0);
        assert_eq!(cam.pan, Vec2::ZERO);
        assert_relative_eq!(cam.distance(), 10.0);
    }

    #[test]
    fn neutral_view_is_pure_translation() {
        let cam = OrbitCamera::new(5.0);
        let view = cam.view_matrix();

        assert_mat4_eq(view, Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)));
        assert_eq!(Mat3::from_mat4(view), Mat3::IDENTITY);
    }

    #[test]
    fn yaw_turns_the_scene_about_world_up() {
        let mut cam = OrbitCamera::new(5.0);
        cam.rotate(90.0, 0.0);
        // A point on +X swings round to -Z, behind the pivot as seen from the eye.
        let p = cam.view_matrix() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, -5.0 - 1.0, epsilon = 1e-5);
    }

    #[test]
    fn pan_is_applied_in_view_space() {
        let mut cam = OrbitCamera::new(5.0);
        cam.rotate(45.0, 30.0);
        cam.pan_by(Vec2::new(2.0, -1.0));
        // The pivot lands at the pan offset regardless of orientation.
        let pivot = cam.view_matrix() * Vec4::W;
        assert_relative_eq!(pivot.x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(pivot.y, -1.0, epsilon = 1e-5);
        assert_relative_eq!(pivot.z, -5.0, epsilon = 1e-5);
    }

    #[test]
    fn orthographic_model_scales_by_distance() {
        let cam = OrbitCamera::new(4.0);
        let center = Vec3::new(1.0, 2.0, 3.0);

        let persp = cam.model_matrix(center, ProjectionMode::Perspective);
        let ortho = cam.model_matrix(center, ProjectionMode::Orthographic);

        assert_eq!(persp.transform_point3(center), Vec3::ZERO);
        let p = ortho.transform_point3(center + Vec3::new(4.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn toggling_twice_restores_projection() {
        let mut cam = OrbitCamera::new(3.0);
        cam.rotate(10.0, 20.0);
        let before = cam.clone();
        let mut mode = ProjectionMode::Perspective;
        let projection = cam.projection_matrix(1.5, mode);

        mode.toggle();
        assert_eq!(mode, ProjectionMode::Orthographic);
        assert_ne!(cam.projection_matrix(1.5, mode), projection);
        mode.toggle();

        assert_eq!(mode, ProjectionMode::Perspective);
        assert_eq!(cam.projection_matrix(1.5, mode), projection);
        assert_eq!(cam, before);
    }

    #[test]
    fn orthographic_depth_pair_is_symmetric() {
        let cam = OrbitCamera::new(3.0);
        let proj = cam.projection_matrix(2.0, ProjectionMode::Orthographic);
        // z = 0 maps to the middle of the depth range, both ends stay inside it.
        assert_relative_eq!(proj.project_point3(Vec3::ZERO).z, 0.0);
        assert_relative_eq!(proj.project_point3(Vec3::new(0.0, 0.0, -FAR_PLANE)).z, 1.0);
        assert_relative_eq!(proj.project_point3(Vec3::new(0.0, 0.0, FAR_PLANE)).z, -1.0);
        assert_relative_eq!(proj.project_point3(Vec3::new(2.0, 1.0, 0.0)).x, 1.0);
    }

    #[test]
    fn pan_scale_tracks_zoom() {
        let mut cam = OrbitCamera::new(2.0);
        let near = cam.pan_scale(ProjectionMode::Perspective, 600);
        cam.set_distance(4.0);
        let far = cam.pan_scale(ProjectionMode::Perspective, 600);

        assert_relative_eq!(far, near * 2.0, epsilon = 1e-6);
        assert_relative_eq!(cam.pan_scale(ProjectionMode::Orthographic, 500), 2.0 / 500.0);
        assert_eq!(cam.pan_scale(ProjectionMode::Perspective, 0), 0.0);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let mv = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let n = normal_matrix(mv) * Vec3::new(1.0, 1.0, 0.0);
        assert_relative_eq!(n.x, 0.5);
        assert_relative_eq!(n.y, 1.0);
    }
}
