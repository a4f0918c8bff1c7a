//! Procedural generation for display meshes, item shapes, and colors.

pub mod behavior;
pub mod color;
pub mod primitives;

pub use behavior::*;
pub use color::*;
pub use primitives::*;
