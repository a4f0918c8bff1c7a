//! Rendering system using wgpu.

pub mod camera;
pub mod mesh;
pub mod pipeline;
pub mod renderer;
pub mod texture;
pub mod vertex;

pub use camera::*;
pub use mesh::*;
pub use renderer::*;
pub use vertex::*;
