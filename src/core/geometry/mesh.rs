use glam::Vec3;

use crate::core::Bounds;
use crate::error::LoadError;

/// Normal handed to vertices whose source has none (points mode).
pub const DEFAULT_NORMAL: Vec3 = Vec3::Y;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub pos: Vec3,    // Position in model space
    pub normal: Vec3, // Unit-ish surface normal
}

impl Vertex {
    pub fn new(pos: Vec3, normal: Vec3) -> Self {
        Self { pos, normal }
    }

    pub fn point(pos: Vec3) -> Self {
        Self {
            pos,
            normal: DEFAULT_NORMAL,
        }
    }
}

/// How the vertex list is assembled when drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// `indices` holds three entries per face.
    Triangles,
    /// Every vertex is an independent point, `indices` is empty.
    Points,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    primitive: Primitive,
}

impl Mesh {
    /// Builds a triangle mesh, rejecting index lists that don't describe whole
    /// faces or that point past the vertex list.
    pub fn triangles(vertices: Vec<Vertex>, indices: Vec<u32>) -> Result<Self, LoadError> {
        if indices.len() % 3 != 0 {
            return Err(LoadError::IndexCountNotTriangles(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(LoadError::InvalidIndex {
                index,
                vertex_count: vertices.len(),
            });
        }
        Ok(Self {
            vertices,
            indices,
            primitive: Primitive::Triangles,
        })
    }

    pub fn points(vertices: Vec<Vertex>) -> Self {
        Self {
            vertices,
            indices: Vec::new(),
            primitive: Primitive::Points,
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn primitive(&self) -> Primitive {
        self.primitive
    }

    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(self.vertices.iter().map(|v| &v.pos))
    }

    /// Interleaved `[px, py, pz, nx, ny, nz]` per vertex, the layout the GPU
    /// side binds to attribute locations 0 and 1.
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.vertices.len() * 6);
        for v in &self.vertices {
            out.extend_from_slice(&v.pos.to_array());
            out.extend_from_slice(&v.normal.to_array());
        }
        out
    }

    // Unit cube centred on the origin, four vertices per side so every side
    // keeps its own flat normal.
    pub fn create_cube() -> Self {
        #[rustfmt::skip]
        let sides = [
            (Vec3::X,     Vec3::Z,     Vec3::Y),
            (Vec3::NEG_X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::Y,     Vec3::X,     Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X,     Vec3::Z),
            (Vec3::Z,     Vec3::X,     Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in sides {
            // Orient (u, v) so that u x v points along the outward normal.
            let u = if u.cross(v).dot(normal) < 0.0 { -u } else { u };
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let pos = (normal + u * su + v * sv) * 0.5;
                vertices.push(Vertex::new(pos, normal));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        Self {
            vertices,
            indices,
            primitive: Primitive::Triangles,
        }
    }
}
