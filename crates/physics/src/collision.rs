//! Collision groups and filtering.

use rapier3d::prelude::*;

/// Collision groups for different entity types.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionGroup {
    /// Static environment (floors, walls, machine shells)
    Environment = 1 << 0,
    /// Dynamic prize items
    Item = 1 << 1,
    /// Static interactable volumes (doors, buttons, machine bodies)
    Interact = 1 << 2,
    /// Picking rays. No collider joins this group; interact volumes
    /// filter to it so only rays can reach them.
    Ray = 1 << 3,
}

impl CollisionGroup {
    /// Create a collision group for the environment.
    pub fn environment() -> (Group, Group) {
        let membership = Group::from_bits_retain(Self::Environment as u32);
        let filter = Group::ALL;
        (membership, filter)
    }

    /// Create a collision group for prize items. Items collide with the
    /// environment and with each other, never with interact volumes.
    pub fn item() -> (Group, Group) {
        let membership = Group::from_bits_retain(Self::Item as u32);
        let filter = Group::from_bits_retain(Self::Environment as u32 | Self::Item as u32);
        (membership, filter)
    }

    /// Create a collision group for interactable volumes. Group tests
    /// are symmetric, so the filter names the ray group: the picking
    /// ray gets through while every solid contact fails the pair test.
    pub fn interact() -> (Group, Group) {
        let membership = Group::from_bits_retain(Self::Interact as u32);
        let filter = Group::from_bits_retain(Self::Ray as u32);
        (membership, filter)
    }

    /// The interact membership as a group, for ray filters.
    pub fn interact_filter() -> Group {
        Group::from_bits_retain(Self::Interact as u32)
    }

    /// Memberships a picking ray carries so interact filters accept it.
    pub fn ray_membership() -> Group {
        Group::from_bits_retain(Self::Ray as u32)
    }
}

/// Component linking an ECS entity to its physics handles.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsBody {
    pub rigid_body: RigidBodyHandle,
    pub collider: Option<ColliderHandle>,
}

impl PhysicsBody {
    pub fn new(rigid_body: RigidBodyHandle) -> Self {
        Self {
            rigid_body,
            collider: None,
        }
    }

    pub fn with_collider(rigid_body: RigidBodyHandle, collider: ColliderHandle) -> Self {
        Self {
            rigid_body,
            collider: Some(collider),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: (Group, Group), b: (Group, Group)) -> bool {
        InteractionGroups::new(a.0, a.1).test(InteractionGroups::new(b.0, b.1))
    }

    #[test]
    fn interact_volumes_answer_rays_and_nothing_else() {
        let ray = (
            CollisionGroup::ray_membership(),
            CollisionGroup::interact_filter(),
        );
        // The pair test is bidirectional; both filters must name the
        // other side's membership for the ray to get through
        assert!(pair(ray, CollisionGroup::interact()));
        assert!(!pair(CollisionGroup::environment(), CollisionGroup::interact()));
        assert!(!pair(CollisionGroup::item(), CollisionGroup::interact()));
    }

    #[test]
    fn items_contact_the_environment_and_each_other() {
        assert!(pair(CollisionGroup::item(), CollisionGroup::item()));
        assert!(pair(CollisionGroup::item(), CollisionGroup::environment()));
    }
}
