//! The slice of OpenGL the viewer actually needs, behind one trait.
//!
//! Everything downstream of context creation (shader management, frame
//! building) is written against [`Gpu`], so it does not care how the entry
//! points were resolved and can be driven by a recording fake in tests.

use std::{
    ffi::{c_void, CStr},
    fmt::{self, Display, Formatter},
};

use glam::{Mat3, Mat4, Vec3};
use log::debug;

use crate::{
    core::Viewport,
    error::{ShaderError, ViewerError},
    geometry::Mesh,
};

mod glow_backend;
#[cfg(test)]
pub(crate) mod recording;

pub use glow_backend::{GlowGeometry, GlowGpu};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl Display for ShaderStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Fixed attribute slots shared by every program and every vertex layout.
pub const ATTRIBUTE_BINDINGS: &[(u32, &str)] = &[(0, "aPosition"), (1, "aNormal")];

pub trait Gpu {
    type Shader: Copy;
    type Program: Copy + PartialEq + fmt::Debug;
    type Uniform: Clone + fmt::Debug;
    type Geometry;

    /// Compiles one stage. A failed shader object is deleted before returning.
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<Self::Shader, ShaderError>;
    fn delete_shader(&self, shader: Self::Shader);

    /// Links two compiled stages with the given attribute slots. A failed
    /// program object is deleted before returning; the stages are left to the
    /// caller.
    fn link_program(
        &self,
        vertex: Self::Shader,
        fragment: Self::Shader,
        attributes: &[(u32, &str)],
    ) -> Result<Self::Program, ShaderError>;
    fn delete_program(&self, program: Self::Program);
    fn use_program(&self, program: Option<Self::Program>);

    /// `None` when the program has no active uniform of that name.
    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<Self::Uniform>;
    fn set_mat4(&self, location: &Self::Uniform, value: &Mat4);
    fn set_mat3(&self, location: &Self::Uniform, value: &Mat3);
    fn set_vec3(&self, location: &Self::Uniform, value: Vec3);
    fn set_i32(&self, location: &Self::Uniform, value: i32);

    fn upload_geometry(&self, mesh: &Mesh) -> Result<Self::Geometry, String>;
    fn draw(&self, geometry: &Self::Geometry);
    fn delete_geometry(&self, geometry: Self::Geometry);

    /// Sets the viewport and clears colour and depth.
    fn begin_frame(&self, viewport: Viewport, clear_color: [f32; 4]);
}

/// GL functions the viewer calls, checked once before the context is used.
pub const REQUIRED_ENTRY_POINTS: &[&CStr] = &[
    c"glGenVertexArrays",
    c"glBindVertexArray",
    c"glGenBuffers",
    c"glBindBuffer",
    c"glBufferData",
    c"glEnableVertexAttribArray",
    c"glVertexAttribPointer",
    c"glCreateShader",
    c"glShaderSource",
    c"glCompileShader",
    c"glGetShaderiv",
    c"glGetShaderInfoLog",
    c"glDeleteShader",
    c"glCreateProgram",
    c"glAttachShader",
    c"glDetachShader",
    c"glBindAttribLocation",
    c"glLinkProgram",
    c"glGetProgramiv",
    c"glGetProgramInfoLog",
    c"glDeleteProgram",
    c"glUseProgram",
    c"glGetUniformLocation",
    c"glUniformMatrix4fv",
    c"glUniformMatrix3fv",
    c"glUniform3f",
    c"glUniform1i",
    c"glDrawArrays",
    c"glDrawElements",
    c"glDeleteBuffers",
    c"glDeleteVertexArrays",
];

/// Fails with the first required function the loader can't resolve.
pub fn check_entry_points(
    mut loader: impl FnMut(&CStr) -> *const c_void,
) -> Result<(), ViewerError> {
    for &name in REQUIRED_ENTRY_POINTS {
        if loader(name).is_null() {
            return Err(ViewerError::MissingEntryPoint(
                name.to_str().unwrap_or("<non-utf8 name>"),
            ));
        }
    }
    debug!("all {} GL entry points resolved", REQUIRED_ENTRY_POINTS.len());
    Ok(())
}
