//! Shader program lifetime and per-frame drawing, both written against
//! [`Gpu`](crate::gpu::Gpu).

pub mod frame;
pub mod shader;

pub use frame::{FrameRenderer, FrameUniforms, CLEAR_COLOR};
pub use shader::{ShaderProgramManager, ShaderSources, UniformLocations};
