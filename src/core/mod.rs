pub mod bounds;
pub mod camera;
pub mod geometry;
pub mod light;
pub mod state;

pub use bounds::Bounds;
pub use camera::{OrbitCamera, ProjectionMode};
pub use light::OrbitLight;
pub use state::{ShadingMode, ViewerState, Viewport};
