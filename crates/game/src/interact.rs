//! Center-screen picking against interact volumes.

use engine_core::Vec3;
use physics::{ColliderHandle, CollisionGroup, PhysicsWorld};

use crate::gachapon::GachaponId;
use crate::transition::SwapTarget;

/// How far the interaction ray reaches.
const REACH: f32 = 100.0;

/// What a click resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// A door leading to another scene.
    Door(SwapTarget),
    /// A machine. `button` is set when the ray also pierced the front
    /// button volume.
    Machine { id: GachaponId, button: bool },
}

/// Maps interact collider handles back to what they belong to. Rebuilt
/// with each scene.
#[derive(Debug, Default)]
pub struct InteractionResolver {
    doors: Vec<(ColliderHandle, SwapTarget)>,
    buttons: Vec<(ColliderHandle, GachaponId)>,
    machines: Vec<(ColliderHandle, GachaponId)>,
}

impl InteractionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.doors.clear();
        self.buttons.clear();
        self.machines.clear();
    }

    pub fn register_door(&mut self, collider: ColliderHandle, target: SwapTarget) {
        self.doors.push((collider, target));
    }

    pub fn register_machine(&mut self, body: ColliderHandle, button: ColliderHandle, id: GachaponId) {
        self.machines.push((body, id));
        self.buttons.push((button, id));
    }

    /// Resolve a click from the camera. The ray collects every interact
    /// volume it pierces; the button volume sits inside the machine
    /// volume, so a button aim reports both.
    pub fn resolve(
        &self,
        physics: &PhysicsWorld,
        origin: Vec3,
        direction: Vec3,
    ) -> Option<Interaction> {
        let hits = physics.raycast_groups_all(
            origin,
            direction,
            REACH,
            CollisionGroup::interact_filter(),
        );
        if hits.is_empty() {
            return None;
        }

        let mut machine: Option<GachaponId> = None;
        let mut button: Option<GachaponId> = None;
        for hit in &hits {
            if let Some(&(_, target)) = self.doors.iter().find(|(c, _)| *c == hit.collider) {
                return Some(Interaction::Door(target));
            }
            if machine.is_none() {
                if let Some(&(_, id)) = self.machines.iter().find(|(c, _)| *c == hit.collider) {
                    machine = Some(id);
                }
            }
            if button.is_none() {
                if let Some(&(_, id)) = self.buttons.iter().find(|(c, _)| *c == hit.collider) {
                    button = Some(id);
                }
            }
        }
        let id = machine.or(button)?;
        Some(Interaction::Machine {
            id,
            button: button == Some(id),
        })
    }
}
