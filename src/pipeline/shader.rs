use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, error, info, warn};

use crate::{
    error::ShaderError,
    gpu::{Gpu, ShaderStage, ATTRIBUTE_BINDINGS},
};

pub const VERTEX_FILE: &str = "shader.vert";
pub const FRAGMENT_FILE: &str = "shader.frag";

/// Used when `shader.vert` is missing or empty.
pub const FALLBACK_VERTEX_SOURCE: &str = "#version 330 core
in vec3 aPosition;
in vec3 aNormal;
uniform mat4 uMvp;
uniform mat4 uModelView;
uniform mat3 uNormalMatrix;
uniform int uShadingMode;
out vec3 vNormal;
out vec3 vViewPos;
void main() {
    vNormal = uNormalMatrix * aNormal;
    vViewPos = (uModelView * vec4(aPosition, 1.0)).xyz;
    gl_PointSize = (uShadingMode == 2) ? 10.0 : 2.0;
    gl_Position = uMvp * vec4(aPosition, 1.0);
}
";

/// Used when `shader.frag` is missing or empty. Diffuse only.
pub const FALLBACK_FRAGMENT_SOURCE: &str = "#version 330 core
in vec3 vNormal;
in vec3 vViewPos;
uniform vec3 uLightPos;
uniform int uShadingMode;
out vec4 fragColor;
void main() {
    vec3 n = normalize(vNormal);
    if (uShadingMode == 1) {
        fragColor = vec4(n * 0.5 + 0.5, 1.0);
    } else if (uShadingMode == 2) {
        fragColor = vec4(1.0, 0.85, 0.25, 1.0);
    } else {
        float d = abs(dot(n, normalize(uLightPos - vViewPos)));
        fragColor = vec4(vec3(0.8) * (0.15 + 0.85 * d), 1.0);
    }
}
";

/// Directory baked in at build time, overridable with `ORBIT_VIEWER_SHADER_DIR`.
fn build_shader_dir() -> PathBuf {
    match option_env!("ORBIT_VIEWER_SHADER_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders"),
    }
}

/// Where the two stage files live. The files themselves are re-read on every
/// reload so edits show up on F6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    dir: PathBuf,
}

impl ShaderSources {
    /// An explicit directory wins, then the build directory if it exists,
    /// then the working directory.
    pub fn resolve(configured: Option<&Path>) -> Self {
        let dir = match configured {
            Some(dir) => dir.to_owned(),
            None => {
                let built = build_shader_dir();
                if built.is_dir() {
                    built
                } else {
                    PathBuf::from(".")
                }
            }
        };
        debug!("shader directory: {}", dir.display());
        Self { dir }
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Vertex and fragment source, each falling back to the built-in one.
    pub fn read(&self) -> (String, String) {
        (
            read_or_fallback(&self.dir.join(VERTEX_FILE), FALLBACK_VERTEX_SOURCE),
            read_or_fallback(&self.dir.join(FRAGMENT_FILE), FALLBACK_FRAGMENT_SOURCE),
        )
    }
}

fn read_or_fallback(path: &Path, fallback: &str) -> String {
    match fs::read_to_string(path) {
        Ok(source) if !source.trim().is_empty() => source,
        Ok(_) => {
            warn!("{} is empty, using built-in shader", path.display());
            fallback.to_string()
        }
        Err(e) => {
            warn!("could not read {} ({e}), using built-in shader", path.display());
            fallback.to_string()
        }
    }
}

/// Uniform handles for one linked program. A uniform the program doesn't use
/// is `None` and simply not set.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformLocations<U> {
    pub mvp: Option<U>,
    pub model_view: Option<U>,
    pub normal_matrix: Option<U>,
    pub light_pos: Option<U>,
    pub shading_mode: Option<U>,
}

impl<U> UniformLocations<U> {
    pub fn lookup<G: Gpu<Uniform = U>>(gpu: &G, program: G::Program) -> Self {
        let find = |name: &str| {
            let location = gpu.uniform_location(program, name);
            if location.is_none() {
                debug!("uniform {name} not active in program {program:?}");
            }
            location
        };
        Self {
            mvp: find("uMvp"),
            model_view: find("uModelView"),
            normal_matrix: find("uNormalMatrix"),
            light_pos: find("uLightPos"),
            shading_mode: find("uShadingMode"),
        }
    }
}

pub struct ActiveProgram<G: Gpu> {
    pub program: G::Program,
    pub uniforms: UniformLocations<G::Uniform>,
}

/// Owns the one program the renderer draws with and swaps it out on reload.
pub struct ShaderProgramManager<G: Gpu> {
    sources: ShaderSources,
    active: Option<ActiveProgram<G>>,
}

impl<G: Gpu> ShaderProgramManager<G> {
    pub fn new(sources: ShaderSources) -> Self {
        Self {
            sources,
            active: None,
        }
    }

    pub fn sources(&self) -> &ShaderSources {
        &self.sources
    }

    pub fn active(&self) -> Option<&ActiveProgram<G>> {
        self.active.as_ref()
    }

    /// Rebuilds the program from the files on disk. On any failure the
    /// previously installed program stays active and nothing is leaked.
    pub fn reload(&mut self, gpu: &G) -> Result<(), ShaderError> {
        let (vertex, fragment) = self.sources.read();
        self.install(gpu, &vertex, &fragment)
            .inspect(|_| info!("shaders loaded from {}", self.sources.dir.display()))
            .inspect_err(|e| error!("shader reload failed, keeping previous program: {e}"))
    }

    fn install(&mut self, gpu: &G, vertex: &str, fragment: &str) -> Result<(), ShaderError> {
        let program = build_program(gpu, vertex, fragment)?;
        let uniforms = UniformLocations::lookup(gpu, program);

        if let Some(previous) = self.active.replace(ActiveProgram { program, uniforms }) {
            gpu.delete_program(previous.program);
        }
        Ok(())
    }

    /// Deletes the active program. Later calls are no-ops.
    pub fn destroy(&mut self, gpu: &G) {
        if let Some(active) = self.active.take() {
            gpu.use_program(None);
            gpu.delete_program(active.program);
        }
    }
}

fn build_program<G: Gpu>(gpu: &G, vertex: &str, fragment: &str) -> Result<G::Program, ShaderError> {
    let vs = gpu.compile_shader(ShaderStage::Vertex, vertex)?;
    let fs = match gpu.compile_shader(ShaderStage::Fragment, fragment) {
        Ok(fs) => fs,
        Err(e) => {
            gpu.delete_shader(vs);
            return Err(e);
        }
    };

    let linked = gpu.link_program(vs, fs, ATTRIBUTE_BINDINGS);
    gpu.delete_shader(vs);
    gpu.delete_shader(fs);
    linked
}
