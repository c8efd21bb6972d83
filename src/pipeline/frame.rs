use glam::{Mat3, Mat4, Vec3};
use log::{debug, info};

use super::shader::ShaderProgramManager;
use crate::{
    core::{camera::normal_matrix, ShadingMode, ViewerState},
    error::{ShaderError, ViewerError},
    geometry::{Mesh, Primitive, Vertex},
    gpu::Gpu,
};

pub const CLEAR_COLOR: [f32; 4] = [0.05, 0.05, 0.08, 1.0];

/// Every matrix a frame needs, derived from the viewer state alone.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUniforms {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub model_view: Mat4,
    pub mvp: Mat4,
    pub normal_matrix: Mat3,
    /// View-space light position; the eye itself when there is no light.
    pub light_view: Vec3,
    /// Places the single marker vertex at the light, `None` without a light.
    pub marker_mvp: Option<Mat4>,
}

impl FrameUniforms {
    pub fn compute(state: &ViewerState) -> Self {
        let camera = &state.camera;
        let model = camera.model_matrix(state.center, state.projection);
        let view = camera.view_matrix();
        let projection = camera.projection_matrix(state.viewport.aspect(), state.projection);
        let model_view = view * model;
        let mvp = projection * model_view;

        let light_view = state
            .light
            .as_ref()
            .map_or(Vec3::ZERO, |light| light.view_position(state.center, model_view));
        let marker_mvp = state
            .light
            .as_ref()
            .map(|light| mvp * Mat4::from_translation(light.object_position(state.center)));

        Self {
            model,
            view,
            projection,
            model_view,
            mvp,
            normal_matrix: normal_matrix(model_view),
            light_view,
            marker_mvp,
        }
    }
}

/// Draws the loaded mesh, plus the light marker, with the active program.
pub struct FrameRenderer<G: Gpu> {
    shaders: ShaderProgramManager<G>,
    mesh: Option<G::Geometry>,
    marker: Option<G::Geometry>,
}

impl<G: Gpu> FrameRenderer<G> {
    pub fn new(shaders: ShaderProgramManager<G>) -> Self {
        Self {
            shaders,
            mesh: None,
            marker: None,
        }
    }

    pub fn shaders(&self) -> &ShaderProgramManager<G> {
        &self.shaders
    }

    pub fn reload_shaders(&mut self, gpu: &G) -> Result<(), ShaderError> {
        self.shaders.reload(gpu)
    }

    /// Uploads `mesh`, replacing anything uploaded before. Triangle meshes
    /// also get a one-point marker for the light.
    pub fn upload(&mut self, gpu: &G, mesh: &Mesh) -> Result<(), ViewerError> {
        self.release_geometry(gpu);

        self.mesh = Some(gpu.upload_geometry(mesh).map_err(ViewerError::Upload)?);
        if mesh.primitive() == Primitive::Triangles {
            let marker = Mesh::points(vec![Vertex::point(Vec3::ZERO)]);
            self.marker = Some(gpu.upload_geometry(&marker).map_err(ViewerError::Upload)?);
        }

        info!(
            "uploaded {} vertices ({:?})",
            mesh.vertices().len(),
            mesh.primitive()
        );
        Ok(())
    }

    /// Clears and draws one frame. Returns `false` when there was nothing to
    /// draw with, which leaves just the cleared background.
    pub fn render(&self, gpu: &G, state: &ViewerState) -> bool {
        gpu.begin_frame(state.viewport, CLEAR_COLOR);

        let (Some(active), Some(mesh)) = (self.shaders.active(), self.mesh.as_ref()) else {
            return false;
        };
        let frame = FrameUniforms::compute(state);
        let uniforms = &active.uniforms;

        gpu.use_program(Some(active.program));
        if let Some(location) = &uniforms.mvp {
            gpu.set_mat4(location, &frame.mvp);
        }
        if let Some(location) = &uniforms.model_view {
            gpu.set_mat4(location, &frame.model_view);
        }
        if let Some(location) = &uniforms.normal_matrix {
            gpu.set_mat3(location, &frame.normal_matrix);
        }
        if let Some(location) = &uniforms.light_pos {
            gpu.set_vec3(location, frame.light_view);
        }
        if let Some(location) = &uniforms.shading_mode {
            gpu.set_i32(location, state.shading.as_uniform());
        }
        gpu.draw(mesh);

        if let (Some(marker), Some(marker_mvp)) = (self.marker.as_ref(), frame.marker_mvp) {
            if let Some(location) = &uniforms.mvp {
                gpu.set_mat4(location, &marker_mvp);
            }
            if let Some(location) = &uniforms.shading_mode {
                gpu.set_i32(location, ShadingMode::Marker.as_uniform());
            }
            gpu.draw(marker);
        }

        gpu.use_program(None);
        true
    }

    fn release_geometry(&mut self, gpu: &G) {
        for geometry in [self.mesh.take(), self.marker.take()].into_iter().flatten() {
            gpu.delete_geometry(geometry);
        }
    }

    /// Frees geometry, then the program. Must run while the context is current.
    pub fn destroy(&mut self, gpu: &G) {
        self.release_geometry(gpu);
        self.shaders.destroy(gpu);
        debug!("gpu resources released");
    }
}
