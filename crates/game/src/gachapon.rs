//! Gachapon machine: part layout, colliders, and capsule chamber.
//!
//! A machine is a stack of box parts with a glass prize chamber on top.
//! Solid colliders keep capsules inside the chamber; two contact-free
//! interact volumes (whole machine, front button) feed the picker.

use engine_core::{Transform, Vec3};
use glam::Quat;
use physics::{ColliderHandle, PhysicsWorld};
use rand::Rng;

/// Identifies a machine within the current scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GachaponId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GachaponState {
    Closed,
    Open,
}

/// One visual part of the machine. `rounded` parts render as spheres,
/// the rest as boxes.
#[derive(Debug, Clone, Copy)]
pub struct GachaponPart {
    pub transform: Transform,
    pub color: [f32; 4],
    pub rounded: bool,
    pub transparent: bool,
}

/// A gachapon machine placed in a scene.
#[derive(Debug)]
pub struct Gachapon {
    pub id: GachaponId,
    pub position: Vec3,
    pub scale: f32,
    pub state: GachaponState,
    /// Interact volume over the whole machine (click to open).
    pub body_volume: ColliderHandle,
    /// Interact volume over the front button (shuffle and dispense).
    pub button_volume: ColliderHandle,
    /// Base, body, and the six chamber panels.
    solid_colliders: Vec<ColliderHandle>,
}

impl Gachapon {
    /// Build a machine at `position` with uniform `scale`, registering
    /// all of its colliders.
    pub fn build(physics: &mut PhysicsWorld, id: GachaponId, position: Vec3, scale: f32) -> Self {
        let s = scale;
        let at = |local: Vec3| position + local * s;

        let mut solid_colliders = Vec::with_capacity(8);
        // Base and body are plain boxes
        solid_colliders.push(physics.add_static_cuboid(
            at(Vec3::new(0.0, 0.15, 0.0)),
            Vec3::new(1.0, 0.15, 1.0) * s,
        ));
        solid_colliders.push(physics.add_static_cuboid(
            at(Vec3::new(0.0, 0.8, 0.0)),
            Vec3::new(0.9, 0.5, 0.9) * s,
        ));

        // Glass chamber: four side panels, floor, and lid ceiling. The
        // chamber spans y 1.3..2.8 in machine-local units.
        let t = 0.05 * s;
        let half = 0.8 * s;
        let half_height = 0.75 * s;
        let mid = 2.05;
        for side in [-1.0, 1.0] {
            solid_colliders.push(physics.add_static_cuboid(
                at(Vec3::new(0.8 * side, mid, 0.0)),
                Vec3::new(t, half_height, half),
            ));
            solid_colliders.push(physics.add_static_cuboid(
                at(Vec3::new(0.0, mid, 0.8 * side)),
                Vec3::new(half, half_height, t),
            ));
        }
        solid_colliders.push(physics.add_static_cuboid(
            at(Vec3::new(0.0, 1.3, 0.0)),
            Vec3::new(half, t, half),
        ));
        solid_colliders.push(physics.add_static_cuboid(
            at(Vec3::new(0.0, 2.9, 0.0)),
            Vec3::new(0.9 * s, 0.1 * s, 0.9 * s),
        ));

        let body_volume = physics.add_interact_cuboid(
            at(Vec3::new(0.0, 1.55, 0.0)),
            Vec3::new(1.0, 1.55, 1.0) * s,
        );
        let button_volume = physics.add_interact_cuboid(
            at(Vec3::new(0.0, 0.85, 1.05)),
            Vec3::new(0.5, 0.25, 0.125) * s,
        );

        Self {
            id,
            position,
            scale,
            state: GachaponState::Closed,
            body_volume,
            button_volume,
            solid_colliders,
        }
    }

    /// Mark the machine open. Returns false if it already was.
    pub fn open(&mut self) -> bool {
        if self.state == GachaponState::Open {
            return false;
        }
        log::info!("Machine {:?} opened", self.id);
        self.state = GachaponState::Open;
        true
    }

    pub fn is_open(&self) -> bool {
        self.state == GachaponState::Open
    }

    /// Axis-aligned spawn region inside the prize chamber, as
    /// `(min, max)` corners. Kept clear of the glass panels so fresh
    /// capsules never start in penetration.
    pub fn internal_volume(&self) -> (Vec3, Vec3) {
        let s = self.scale;
        (
            self.position + Vec3::new(-0.5, 1.5, -0.7) * s,
            self.position + Vec3::new(0.5, 2.0, 0.7) * s,
        )
    }

    /// Random point sampled uniformly inside the internal volume.
    pub fn spawn_point<R: Rng>(&self, rng: &mut R) -> Vec3 {
        let (min, max) = self.internal_volume();
        Vec3::new(
            rng.gen_range(min.x..max.x),
            rng.gen_range(min.y..max.y),
            rng.gen_range(min.z..max.z),
        )
    }

    /// Where a released capsule is teleported: just above the lid, so it
    /// rolls off the machine.
    pub fn release_point(&self) -> Vec3 {
        self.position + Vec3::new(0.0, 3.0 * self.scale, 0.0)
    }

    /// Every collider this machine registered, for scene disposal.
    pub fn all_colliders(&self) -> impl Iterator<Item = ColliderHandle> + '_ {
        self.solid_colliders
            .iter()
            .copied()
            .chain([self.body_volume, self.button_volume])
    }

    /// Visual parts in machine-local layout, positioned in world space.
    pub fn parts(&self) -> Vec<GachaponPart> {
        let s = self.scale;
        let part = |local: Vec3, size: Vec3, color: [f32; 4], rounded, transparent| GachaponPart {
            transform: Transform {
                position: self.position + local * s,
                rotation: Quat::IDENTITY,
                scale: size * s,
            },
            color,
            rounded,
            transparent,
        };

        let shell = [0.78, 0.16, 0.2, 1.0];
        let dark = [0.22, 0.22, 0.25, 1.0];
        let glass = [0.72, 0.85, 1.0, 0.25];
        let button = if self.is_open() {
            [0.4, 0.85, 0.35, 1.0]
        } else {
            [0.95, 0.78, 0.2, 1.0]
        };

        vec![
            part(
                Vec3::new(0.0, 0.15, 0.0),
                Vec3::new(2.0, 0.3, 2.0),
                dark,
                false,
                false,
            ),
            part(
                Vec3::new(0.0, 0.8, 0.0),
                Vec3::new(1.8, 1.0, 1.8),
                shell,
                false,
                false,
            ),
            part(
                Vec3::new(0.0, 2.05, 0.0),
                Vec3::new(1.6, 1.5, 1.6),
                glass,
                false,
                true,
            ),
            part(
                Vec3::new(0.0, 2.9, 0.0),
                Vec3::new(1.8, 0.2, 1.8),
                shell,
                false,
                false,
            ),
            part(
                Vec3::new(0.0, 3.15, 0.0),
                Vec3::splat(0.3),
                dark,
                true,
                false,
            ),
            part(
                Vec3::new(0.0, 0.85, 1.05),
                Vec3::new(1.0, 0.5, 0.25),
                button,
                false,
                false,
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn machine(physics: &mut PhysicsWorld) -> Gachapon {
        Gachapon::build(physics, GachaponId(0), Vec3::new(3.0, 0.0, -2.0), 1.0)
    }

    #[test]
    fn build_registers_all_colliders() {
        let mut physics = PhysicsWorld::new();
        let m = machine(&mut physics);
        // 8 solid + 2 interact volumes
        assert_eq!(m.all_colliders().count(), 10);
        assert_eq!(physics.collider_set.len(), 10);
    }

    #[test]
    fn spawn_points_stay_inside_the_internal_volume() {
        let mut physics = PhysicsWorld::new();
        let m = machine(&mut physics);
        let (min, max) = m.internal_volume();
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let p = m.spawn_point(&mut rng);
            assert!(p.x >= min.x && p.x <= max.x);
            assert!(p.y >= min.y && p.y <= max.y);
            assert!(p.z >= min.z && p.z <= max.z);
        }
    }

    #[test]
    fn internal_volume_scales_with_the_machine() {
        let mut physics = PhysicsWorld::new();
        let m = Gachapon::build(&mut physics, GachaponId(2), Vec3::new(1.0, 0.0, 0.0), 2.0);
        let (min, max) = m.internal_volume();
        assert_eq!(min, Vec3::new(0.0, 3.0, -1.4));
        assert_eq!(max, Vec3::new(2.0, 4.0, 1.4));
    }

    #[test]
    fn release_point_clears_the_lid() {
        let mut physics = PhysicsWorld::new();
        let m = machine(&mut physics);
        let p = m.release_point();
        // Lid ceiling tops out at y 3.0 for scale 1
        assert!(p.y >= m.position.y + 3.0);
    }

    #[test]
    fn open_is_one_way() {
        let mut physics = PhysicsWorld::new();
        let mut m = machine(&mut physics);
        assert!(!m.is_open());
        assert!(m.open());
        assert!(!m.open());
        assert!(m.is_open());
    }

    #[test]
    fn picker_ray_sees_button_in_front_of_body() {
        let mut physics = PhysicsWorld::new();
        let m = machine(&mut physics);
        physics.update_query_pipeline();

        // Stand in front of the machine, look at the button
        let origin = m.position + Vec3::new(0.0, 0.85, 5.0);
        let hits = physics.raycast_groups_all(
            origin,
            Vec3::new(0.0, 0.0, -1.0),
            50.0,
            physics::CollisionGroup::interact_filter(),
        );
        assert!(hits.iter().any(|h| h.collider == m.button_volume));
        assert!(hits.iter().any(|h| h.collider == m.body_volume));
    }
}
