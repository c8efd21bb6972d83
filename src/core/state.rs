use std::fmt::{self, Display, Formatter};

use glam::Vec3;

use super::{
    camera::{OrbitCamera, ProjectionMode},
    geometry::{Mesh, Primitive},
    light::OrbitLight,
};

/// Selects the fragment path in the shader through the `uShadingMode` uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadingMode {
    #[default]
    Lit,
    /// Debug view: surface normals written out as colour.
    Normals,
    /// Flat colour used for the light marker point.
    Marker,
}

impl ShadingMode {
    pub fn as_uniform(self) -> i32 {
        match self {
            ShadingMode::Lit => 0,
            ShadingMode::Normals => 1,
            ShadingMode::Marker => 2,
        }
    }

    /// Flips between lit and normals-as-colour. The marker mode is never a
    /// mesh mode.
    pub fn toggle_normals(&mut self) {
        *self = match self {
            ShadingMode::Normals => ShadingMode::Lit,
            _ => ShadingMode::Normals,
        };
    }
}

impl Display for ShadingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ShadingMode::Lit => write!(f, "Lit"),
            ShadingMode::Normals => write!(f, "Normals"),
            ShadingMode::Marker => write!(f, "Marker"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Everything the input router mutates and the frame builder reads.
#[derive(Debug, Clone)]
pub struct ViewerState {
    pub camera: OrbitCamera,
    pub light: Option<OrbitLight>,
    pub projection: ProjectionMode,
    pub shading: ShadingMode,
    /// Auto-orbit is held while paused.
    pub paused: bool,
    /// Auto-orbit rate in degrees of yaw per second.
    pub speed: f32,
    pub viewport: Viewport,
    /// Pivot for both orbits: the mesh's bounding-box center.
    pub center: Vec3,
    pub primitive: Primitive,
}

impl ViewerState {
    /// Seeds the pivot and camera distance from the mesh bounds. Triangle
    /// meshes get an orbiting light, point clouds don't.
    pub fn for_mesh(mesh: &Mesh, viewport: Viewport, speed: f32) -> Self {
        let bounds = mesh.bounds();
        let extent = bounds.max_extent();
        let light = match mesh.primitive() {
            Primitive::Triangles => Some(OrbitLight::for_extent(extent)),
            Primitive::Points => None,
        };

        Self {
            camera: OrbitCamera::new(OrbitCamera::framing_distance(extent)),
            light,
            projection: ProjectionMode::default(),
            shading: ShadingMode::default(),
            paused: false,
            speed,
            viewport,
            center: bounds.center(),
            primitive: mesh.primitive(),
        }
    }

    /// Advances the auto-orbit by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        if !self.paused && self.speed != 0.0 {
            self.camera.yaw += self.speed * dt;
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::new(width, height);
    }

    pub fn pan_scale(&self) -> f32 {
        self.camera.pan_scale(self.projection, self.viewport.height)
    }

    pub fn status_title(&self, fps: f32) -> String {
        format!(
            "orbit_viewer | {} | {} | {} | {:.0} fps",
            self.projection,
            self.shading,
            if self.paused { "paused" } else { "running" },
            fps
        )
    }
}
