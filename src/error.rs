use std::path::PathBuf;

use thiserror::Error;

use crate::gpu::ShaderStage;

/// Failures while turning an asset file into a [`Mesh`](crate::geometry::Mesh).
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to import {path}: {source}")]
    Import {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("{0} has no vertex positions")]
    NoVertices(PathBuf),

    #[error("{0} has no faces")]
    NoFaces(PathBuf),

    #[error("index {index} out of range for {vertex_count} vertices")]
    InvalidIndex { index: u32, vertex_count: usize },

    #[error("index count {0} is not a multiple of 3")]
    IndexCountNotTriangles(usize),
}

/// A shader reload that did not produce a usable program.
///
/// The previously active program is still installed when this is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    #[error("{stage} shader compile failed:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("program link failed:\n{log}")]
    Link { log: String },

    #[error("gpu resource allocation failed: {0}")]
    Resource(String),
}

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("missing OpenGL function: {0}")]
    MissingEntryPoint(&'static str),

    #[error("window creation failed: {0}")]
    Window(String),

    #[error("OpenGL context error: {0}")]
    Context(String),

    #[error("gpu upload failed: {0}")]
    Upload(String),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("logger setup failed: {0}")]
    Logger(String),
}

impl From<glutin::error::Error> for ViewerError {
    fn from(e: glutin::error::Error) -> Self {
        ViewerError::Context(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
