mod loader;
mod mesh;
pub mod process;

pub use loader::{load_mesh, load_points};
pub use mesh::{Mesh, Primitive, Vertex, DEFAULT_NORMAL};
