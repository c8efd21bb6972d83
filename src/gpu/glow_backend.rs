use glam::{Mat3, Mat4, Vec3};
use glow::HasContext as _;
use log::info;

use super::{Gpu, ShaderStage};
use crate::{
    core::Viewport,
    error::ShaderError,
    geometry::{Mesh, Primitive},
};

/// Bytes per interleaved vertex: position then normal, three floats each.
const VERTEX_STRIDE: i32 = 6 * std::mem::size_of::<f32>() as i32;
const NORMAL_OFFSET: i32 = 3 * std::mem::size_of::<f32>() as i32;

/// [`Gpu`] over a `glow` context that is current on this thread.
pub struct GlowGpu {
    gl: glow::Context,
}

/// Vertex array plus its buffers for one uploaded mesh.
pub struct GlowGeometry {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ebo: Option<glow::Buffer>,
    count: i32,
    primitive: Primitive,
}

impl GlowGpu {
    /// Takes ownership of a freshly loaded context and sets the fixed
    /// pipeline state the viewer relies on.
    pub fn new(gl: glow::Context) -> Self {
        unsafe {
            info!(
                "OpenGL {} ({})",
                gl.get_parameter_string(glow::VERSION),
                gl.get_parameter_string(glow::RENDERER)
            );
            gl.enable(glow::DEPTH_TEST);
            // Lets the vertex stage size the point primitives.
            gl.enable(glow::PROGRAM_POINT_SIZE);
        }
        Self { gl }
    }
}

impl ShaderStage {
    fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl Gpu for GlowGpu {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type Uniform = glow::UniformLocation;
    type Geometry = GlowGeometry;

    fn compile_shader(
        &self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<Self::Shader, ShaderError> {
        unsafe {
            let shader = self
                .gl
                .create_shader(stage.gl_enum())
                .map_err(ShaderError::Resource)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if self.gl.get_shader_compile_status(shader) {
                return Ok(shader);
            }
            let log = self.gl.get_shader_info_log(shader);
            self.gl.delete_shader(shader);
            Err(ShaderError::Compile { stage, log })
        }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn link_program(
        &self,
        vertex: Self::Shader,
        fragment: Self::Shader,
        attributes: &[(u32, &str)],
    ) -> Result<Self::Program, ShaderError> {
        unsafe {
            let program = self.gl.create_program().map_err(ShaderError::Resource)?;
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            for &(index, name) in attributes {
                self.gl.bind_attrib_location(program, index, name);
            }
            self.gl.link_program(program);
            self.gl.detach_shader(program, vertex);
            self.gl.detach_shader(program, fragment);

            if self.gl.get_program_link_status(program) {
                return Ok(program);
            }
            let log = self.gl.get_program_info_log(program);
            self.gl.delete_program(program);
            Err(ShaderError::Link { log })
        }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<Self::Uniform> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn set_mat4(&self, location: &Self::Uniform, value: &Mat4) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(location), false, &value.to_cols_array())
        }
    }

    fn set_mat3(&self, location: &Self::Uniform, value: &Mat3) {
        unsafe {
            self.gl
                .uniform_matrix_3_f32_slice(Some(location), false, &value.to_cols_array())
        }
    }

    fn set_vec3(&self, location: &Self::Uniform, value: Vec3) {
        unsafe { self.gl.uniform_3_f32(Some(location), value.x, value.y, value.z) }
    }

    fn set_i32(&self, location: &Self::Uniform, value: i32) {
        unsafe { self.gl.uniform_1_i32(Some(location), value) }
    }

    fn upload_geometry(&self, mesh: &Mesh) -> Result<Self::Geometry, String> {
        let vertices = mesh.interleaved();
        unsafe {
            let vao = self.gl.create_vertex_array()?;
            self.gl.bind_vertex_array(Some(vao));

            let vbo = self.gl.create_buffer()?;
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&vertices),
                glow::STATIC_DRAW,
            );
            self.gl.enable_vertex_attrib_array(0);
            self.gl
                .vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, VERTEX_STRIDE, 0);
            self.gl.enable_vertex_attrib_array(1);
            self.gl
                .vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, VERTEX_STRIDE, NORMAL_OFFSET);

            let (ebo, count) = match mesh.primitive() {
                Primitive::Triangles => {
                    let ebo = self.gl.create_buffer()?;
                    // Element binding is recorded in the bound vertex array.
                    self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
                    self.gl.buffer_data_u8_slice(
                        glow::ELEMENT_ARRAY_BUFFER,
                        bytemuck::cast_slice(mesh.indices()),
                        glow::STATIC_DRAW,
                    );
                    (Some(ebo), mesh.indices().len())
                }
                Primitive::Points => (None, mesh.vertices().len()),
            };

            self.gl.bind_vertex_array(None);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);

            Ok(GlowGeometry {
                vao,
                vbo,
                ebo,
                count: count.min(i32::MAX as usize) as i32,
                primitive: mesh.primitive(),
            })
        }
    }

    fn draw(&self, geometry: &Self::Geometry) {
        unsafe {
            self.gl.bind_vertex_array(Some(geometry.vao));
            match geometry.primitive {
                Primitive::Triangles => {
                    self.gl
                        .draw_elements(glow::TRIANGLES, geometry.count, glow::UNSIGNED_INT, 0)
                }
                Primitive::Points => self.gl.draw_arrays(glow::POINTS, 0, geometry.count),
            }
            self.gl.bind_vertex_array(None);
        }
    }

    fn delete_geometry(&self, geometry: Self::Geometry) {
        unsafe {
            if let Some(ebo) = geometry.ebo {
                self.gl.delete_buffer(ebo);
            }
            self.gl.delete_buffer(geometry.vbo);
            self.gl.delete_vertex_array(geometry.vao);
        }
    }

    fn begin_frame(&self, viewport: Viewport, clear_color: [f32; 4]) {
        let [r, g, b, a] = clear_color;
        unsafe {
            self.gl.viewport(
                0,
                0,
                viewport.width.min(i32::MAX as u32) as i32,
                viewport.height.min(i32::MAX as u32) as i32,
            );
            self.gl.clear_color(r, g, b, a);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }
}
