//! In-memory [`Gpu`] for tests: validates sources loosely, hands out
//! integer handles and logs every state-changing call.

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet},
};

use glam::{Mat3, Mat4, Vec3};

use super::{Gpu, ShaderStage};
use crate::{
    core::Viewport,
    error::ShaderError,
    geometry::{Mesh, Primitive},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    UseProgram(Option<u32>),
    SetMat4(String, Mat4),
    SetMat3(String, Mat3),
    SetVec3(String, Vec3),
    SetI32(String, i32),
    Draw(u32, Primitive),
    BeginFrame(Viewport),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedGeometry {
    pub id: u32,
    pub primitive: Primitive,
}

#[derive(Default)]
pub struct RecordingGpu {
    next_id: Cell<u32>,
    /// Source of each live shader object.
    shaders: RefCell<HashMap<u32, String>>,
    /// Combined source of each live program, used for uniform lookups.
    programs: RefCell<HashMap<u32, String>>,
    geometries: RefCell<HashSet<u32>>,
    calls: RefCell<Vec<Call>>,
    pub fail_link: Cell<bool>,
    pub fail_upload: Cell<bool>,
}

impl RecordingGpu {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> u32 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.borrow().len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.borrow().len()
    }

    pub fn live_geometries(&self) -> usize {
        self.geometries.borrow().len()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

/// Stand-in for a compiler: an entry point and balanced delimiters.
fn looks_valid(source: &str) -> bool {
    let balanced = |open, close| {
        let mut depth = 0i32;
        for c in source.chars() {
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
        }
        depth == 0
    };
    source.contains("void main") && balanced('(', ')') && balanced('{', '}')
}

impl Gpu for RecordingGpu {
    type Shader = u32;
    type Program = u32;
    type Uniform = String;
    type Geometry = RecordedGeometry;

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<u32, ShaderError> {
        if !looks_valid(source) {
            return Err(ShaderError::Compile {
                stage,
                log: "0:1: syntax error".to_string(),
            });
        }
        let id = self.next();
        self.shaders.borrow_mut().insert(id, source.to_string());
        Ok(id)
    }

    fn delete_shader(&self, shader: u32) {
        self.shaders.borrow_mut().remove(&shader);
    }

    fn link_program(
        &self,
        vertex: u32,
        fragment: u32,
        _attributes: &[(u32, &str)],
    ) -> Result<u32, ShaderError> {
        if self.fail_link.get() {
            return Err(ShaderError::Link {
                log: "varying mismatch".to_string(),
            });
        }
        let shaders = self.shaders.borrow();
        let (Some(vs), Some(fs)) = (shaders.get(&vertex), shaders.get(&fragment)) else {
            return Err(ShaderError::Link {
                log: "unknown shader object".to_string(),
            });
        };
        let source = format!("{vs}\n{fs}");
        drop(shaders);

        let id = self.next();
        self.programs.borrow_mut().insert(id, source);
        Ok(id)
    }

    fn delete_program(&self, program: u32) {
        self.programs.borrow_mut().remove(&program);
    }

    fn use_program(&self, program: Option<u32>) {
        self.record(Call::UseProgram(program));
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<String> {
        self.programs
            .borrow()
            .get(&program)
            .filter(|source| source.contains(name))
            .map(|_| name.to_string())
    }

    fn set_mat4(&self, location: &String, value: &Mat4) {
        self.record(Call::SetMat4(location.clone(), *value));
    }

    fn set_mat3(&self, location: &String, value: &Mat3) {
        self.record(Call::SetMat3(location.clone(), *value));
    }

    fn set_vec3(&self, location: &String, value: Vec3) {
        self.record(Call::SetVec3(location.clone(), value));
    }

    fn set_i32(&self, location: &String, value: i32) {
        self.record(Call::SetI32(location.clone(), value));
    }

    fn upload_geometry(&self, mesh: &Mesh) -> Result<RecordedGeometry, String> {
        if self.fail_upload.get() {
            return Err("out of memory".to_string());
        }
        let id = self.next();
        self.geometries.borrow_mut().insert(id);
        Ok(RecordedGeometry {
            id,
            primitive: mesh.primitive(),
        })
    }

    fn draw(&self, geometry: &RecordedGeometry) {
        self.record(Call::Draw(geometry.id, geometry.primitive));
    }

    fn delete_geometry(&self, geometry: RecordedGeometry) {
        self.geometries.borrow_mut().remove(&geometry.id);
    }

    fn begin_frame(&self, viewport: Viewport, _clear_color: [f32; 4]) {
        self.record(Call::BeginFrame(viewport));
    }
}
