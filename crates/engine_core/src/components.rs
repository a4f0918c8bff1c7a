//! Common ECS components shared by scene-owned entities.

/// Marks an entity as owned by a particular scene generation.
///
/// When the active scene is replaced, every entity whose generation
/// matches the outgoing scene is despawned as part of disposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneMember {
    pub generation: u32,
}

impl SceneMember {
    pub fn new(generation: u32) -> Self {
        Self { generation }
    }
}

/// Per-entity render tint (RGBA, linear). Multiplied with the mesh in
/// the instanced color pass.
#[derive(Debug, Clone, Copy)]
pub struct NodeColor(pub [f32; 4]);

impl Default for NodeColor {
    fn default() -> Self {
        Self([1.0, 1.0, 1.0, 1.0])
    }
}
