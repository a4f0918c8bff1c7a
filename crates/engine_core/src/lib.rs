//! Core engine types for the gachapon walking simulator.
//!
//! This crate provides the foundational types used across all systems:
//! - Transform and spatial components
//! - Frame time management
//! - Common component types shared by scene-owned entities

pub mod components;
pub mod time;
pub mod transform;

pub use components::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use hecs::{Entity, World};
