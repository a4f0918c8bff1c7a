//! Prize capsule lifecycle: spawn, activate, simulate, release, cull.

use engine_core::{Entity, NodeColor, SceneMember, Transform, Vec3, World};
use physics::{ItemBodyDesc, ItemShape, PhysicsBody, PhysicsWorld, RigidBodyHandle};
use procgen::{apply_behavior, behavior_for, random_prize_color, ShapeKind};
use rand::Rng;

use crate::gachapon::{Gachapon, GachaponId};

/// How far from the origin an item may drift before it is culled.
const CULL_DISTANCE: f32 = 100.0;
/// Items below this height fell out of the world.
const CULL_FLOOR: f32 = -10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(pub u64);

/// Marks an entity as a prize capsule from a specific machine.
#[derive(Debug, Clone, Copy)]
pub struct GachaponItem {
    pub id: ItemId,
    pub kind: ShapeKind,
    pub machine: GachaponId,
    /// Base render scale; the idle animation pulses around it.
    pub scale: f32,
    /// Set when the machine opens; only active capsules can be released.
    pub active: bool,
    /// Released items have left the chamber and just tumble until culled.
    pub released: bool,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ItemStats {
    pub spawned: u64,
    pub released: u64,
    pub culled: u64,
}

/// Owns item identity and the spawn/release/cull lifecycle. Physics and
/// ECS state are passed in per call.
#[derive(Debug)]
pub struct ItemManager {
    next_id: u64,
    /// Default capsule count for a spawn burst.
    prize_amount: u32,
    pub stats: ItemStats,
}

impl Default for ItemManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemManager {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            prize_amount: 30,
            stats: ItemStats::default(),
        }
    }

    pub fn set_prize_amount(&mut self, amount: u32) {
        self.prize_amount = amount;
    }

    /// Fill a machine's chamber with capsules. `amount` overrides the
    /// default prize amount. Returns the ids of the new batch.
    pub fn spawn_burst<R: Rng>(
        &mut self,
        physics: &mut PhysicsWorld,
        world: &mut World,
        machine: &Gachapon,
        amount: Option<u32>,
        generation: u32,
        rng: &mut R,
    ) -> Vec<ItemId> {
        let amount = amount.unwrap_or(self.prize_amount);
        let size = 0.25 * machine.scale;
        let mut batch = Vec::with_capacity(amount as usize);
        for _ in 0..amount {
            let kind = ShapeKind::ALL[rng.gen_range(0..ShapeKind::ALL.len())];
            let position = machine.spawn_point(rng);
            let desc = ItemBodyDesc {
                position,
                shape: collider_proxy(kind, size),
                mass: rng.gen_range(0.3..0.6),
                linear_damping: 0.3,
                angular_damping: 0.5,
                friction: 0.5,
                restitution: 0.2,
                angular_velocity: Vec3::new(
                    rng.gen_range(-0.15..0.15),
                    rng.gen_range(-0.15..0.15),
                    rng.gen_range(-0.15..0.15),
                ),
            };
            let (body, collider) = physics.add_item_body(&desc);

            let id = ItemId(self.next_id);
            self.next_id += 1;
            self.stats.spawned += 1;
            batch.push(id);

            world.spawn((
                Transform {
                    position,
                    scale: Vec3::splat(size),
                    ..Default::default()
                },
                PhysicsBody::with_collider(body, collider),
                GachaponItem {
                    id,
                    kind,
                    machine: machine.id,
                    scale: size,
                    active: false,
                    released: false,
                },
                NodeColor(random_prize_color(rng)),
                SceneMember::new(generation),
            ));
        }
        log::info!("Spawned {} capsules in machine {:?}", amount, machine.id);
        batch
    }

    /// Mark every capsule in a machine interactable. Fired once when the
    /// machine opens. Returns how many were activated.
    pub fn activate(&mut self, world: &mut World, machine: GachaponId) -> usize {
        let mut activated = 0;
        for (_, item) in world.query_mut::<&mut GachaponItem>() {
            if item.machine == machine && !item.active {
                item.active = true;
                activated += 1;
            }
        }
        activated
    }

    /// Kick every capsule still inside the machine.
    pub fn shuffle<R: Rng>(
        &mut self,
        physics: &mut PhysicsWorld,
        world: &mut World,
        machine: GachaponId,
        rng: &mut R,
    ) {
        let mut kicked = 0;
        for (_, (item, body)) in world.query_mut::<(&GachaponItem, &PhysicsBody)>() {
            if item.machine != machine || item.released {
                continue;
            }
            let impulse = Vec3::new(
                rng.gen_range(-0.5..0.5),
                rng.gen_range(0.0..1.0),
                rng.gen_range(-0.5..0.5),
            );
            physics.apply_impulse(body.rigid_body, impulse);
            kicked += 1;
        }
        log::debug!("Shuffled {kicked} capsules in machine {machine:?}");
    }

    /// Dispense one capsule chosen uniformly at random among the active
    /// ones: teleport it above the lid with a small outward toss.
    /// Returns the released item, if any remained.
    pub fn release<R: Rng>(
        &mut self,
        physics: &mut PhysicsWorld,
        world: &mut World,
        machine: &Gachapon,
        rng: &mut R,
    ) -> Option<ItemId> {
        let candidates: Vec<(Entity, RigidBodyHandle, ItemId)> = world
            .query::<(&GachaponItem, &PhysicsBody)>()
            .iter()
            .filter(|(_, (item, _))| {
                item.machine == machine.id && item.active && !item.released
            })
            .map(|(entity, (item, body))| (entity, body.rigid_body, item.id))
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let (entity, body, id) = candidates[rng.gen_range(0..candidates.len())];

        physics.set_body_position(body, machine.release_point());
        physics.set_body_velocity(
            body,
            Vec3::new(
                rng.gen_range(-0.25..0.25),
                rng.gen_range(1.0..1.5),
                rng.gen_range(-0.25..0.25),
            ),
        );
        // Chamber capsules are heavily damped; the dispensed one tumbles
        physics.set_linear_damping(body, 0.3);
        physics.set_angular_damping(body, 0.3);

        if let Ok(mut item) = world.get::<&mut GachaponItem>(entity) {
            item.released = true;
        }
        self.stats.released += 1;
        log::info!("Machine {:?} dispensed capsule {:?}", machine.id, id);
        Some(id)
    }

    /// Copy simulated poses onto item transforms, then layer the shared
    /// per-kind idle animation on top.
    pub fn update(&self, physics: &PhysicsWorld, world: &mut World, dt: f32, elapsed: f32) {
        for (_, (transform, body, item)) in
            world.query_mut::<(&mut Transform, &PhysicsBody, &GachaponItem)>()
        {
            if let Some(pose) = physics.body_transform(body.rigid_body) {
                let rest = Transform {
                    position: pose.position,
                    rotation: pose.rotation,
                    scale: Vec3::splat(item.scale),
                };
                *transform = rest;
                apply_behavior(transform, &rest, behavior_for(item.kind), dt, elapsed);
            }
        }
    }

    /// Remove capsules that drifted out of bounds or fell through the
    /// floor. Returns how many were culled.
    pub fn cull(&mut self, physics: &mut PhysicsWorld, world: &mut World) -> usize {
        let mut doomed = Vec::new();
        for (entity, (_, body)) in world.query::<(&GachaponItem, &PhysicsBody)>().iter() {
            if let Some(pos) = physics.body_position(body.rigid_body) {
                if pos.length() > CULL_DISTANCE || pos.y < CULL_FLOOR {
                    doomed.push((entity, body.rigid_body));
                }
            }
        }
        self.remove_all(physics, world, &doomed);
        self.stats.culled += doomed.len() as u64;
        doomed.len()
    }

    /// Remove every capsule belonging to one machine.
    pub fn cleanup_machine(
        &mut self,
        physics: &mut PhysicsWorld,
        world: &mut World,
        machine: GachaponId,
    ) {
        let doomed: Vec<_> = world
            .query::<(&GachaponItem, &PhysicsBody)>()
            .iter()
            .filter(|(_, (item, _))| item.machine == machine)
            .map(|(entity, (_, body))| (entity, body.rigid_body))
            .collect();
        self.remove_all(physics, world, &doomed);
    }

    /// Remove every capsule, bodies included. Used on scene disposal.
    pub fn despawn_all(&mut self, physics: &mut PhysicsWorld, world: &mut World) {
        let doomed: Vec<_> = world
            .query::<(&GachaponItem, &PhysicsBody)>()
            .iter()
            .map(|(entity, (_, body))| (entity, body.rigid_body))
            .collect();
        self.remove_all(physics, world, &doomed);
    }

    fn remove_all(
        &mut self,
        physics: &mut PhysicsWorld,
        world: &mut World,
        doomed: &[(Entity, RigidBodyHandle)],
    ) {
        for &(entity, body) in doomed {
            physics.remove_body(body);
            let _ = world.despawn(entity);
        }
    }

    /// Capsules still waiting inside a machine.
    pub fn count_in_machine(&self, world: &World, machine: GachaponId) -> usize {
        world
            .query::<&GachaponItem>()
            .iter()
            .filter(|(_, item)| item.machine == machine && !item.released)
            .count()
    }

    /// All live capsules, released ones included.
    pub fn live_count(&self, world: &World) -> usize {
        world.query::<&GachaponItem>().iter().count()
    }
}

/// Physics proxy for a display shape. Capsule simulation only needs a
/// rough convex stand-in for each mesh.
fn collider_proxy(kind: ShapeKind, size: f32) -> ItemShape {
    match kind {
        ShapeKind::Cube => ItemShape::Cuboid {
            half_extents: Vec3::splat(0.5 * size),
        },
        ShapeKind::Sphere => ItemShape::Ball { radius: 0.6 * size },
        ShapeKind::Cone => ItemShape::Cone {
            half_height: 0.6 * size,
            radius: 0.6 * size,
        },
        ShapeKind::Cylinder => ItemShape::Cylinder {
            half_height: 0.5 * size,
            radius: 0.5 * size,
        },
        ShapeKind::Torus => ItemShape::Ball { radius: 0.6 * size },
        ShapeKind::Tetrahedron | ShapeKind::Octahedron => ItemShape::Ball { radius: 0.7 * size },
        ShapeKind::Dodecahedron | ShapeKind::Icosahedron => {
            ItemShape::Ball { radius: 0.6 * size }
        }
        ShapeKind::TorusKnot => ItemShape::Ball {
            radius: 0.55 * size,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gachapon::GachaponId;
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;

    struct Rig {
        physics: PhysicsWorld,
        world: World,
        items: ItemManager,
        machine: Gachapon,
        rng: rand::rngs::StdRng,
    }

    fn rig() -> Rig {
        let mut physics = PhysicsWorld::new();
        // Room floor
        physics.add_static_cuboid(Vec3::new(0.0, -0.5, 0.0), Vec3::new(50.0, 0.5, 50.0));
        let machine = Gachapon::build(&mut physics, GachaponId(0), Vec3::ZERO, 1.0);
        Rig {
            physics,
            world: World::new(),
            items: ItemManager::new(),
            machine,
            rng: rand::rngs::StdRng::seed_from_u64(42),
        }
    }

    fn spawn(r: &mut Rig, amount: u32) -> Vec<ItemId> {
        r.items.spawn_burst(
            &mut r.physics,
            &mut r.world,
            &r.machine,
            Some(amount),
            0,
            &mut r.rng,
        )
    }

    fn activate(r: &mut Rig) -> usize {
        r.items.activate(&mut r.world, GachaponId(0))
    }

    #[test]
    fn burst_spawns_the_requested_amount() {
        let mut r = rig();
        let batch = spawn(&mut r, 5);
        assert_eq!(batch.len(), 5);
        assert_eq!(r.items.live_count(&r.world), 5);
        assert_eq!(r.items.count_in_machine(&r.world, GachaponId(0)), 5);
        for (_, (item, transform)) in r.world.query::<(&GachaponItem, &Transform)>().iter() {
            assert_eq!(item.machine, GachaponId(0));
            let local = transform.position - r.machine.position;
            assert!(local.x.abs() <= 0.5 && local.z.abs() <= 0.7);
            assert!((1.5..2.0).contains(&local.y));
        }
    }

    #[test]
    fn default_prize_amount_is_used_when_unspecified() {
        let mut r = rig();
        r.items.set_prize_amount(7);
        let batch = r.items.spawn_burst(
            &mut r.physics,
            &mut r.world,
            &r.machine,
            None,
            0,
            &mut r.rng,
        );
        assert_eq!(batch.len(), 7);
    }

    #[test]
    fn capsules_settle_inside_the_chamber() {
        let mut r = rig();
        spawn(&mut r, 20);
        for _ in 0..600 {
            r.physics.step(DT);
        }
        for (_, (_, body)) in r.world.query::<(&GachaponItem, &PhysicsBody)>().iter() {
            let pos = r.physics.body_position(body.rigid_body).unwrap();
            assert!(pos.x.abs() < 1.0, "capsule escaped sideways: {pos:?}");
            assert!(pos.z.abs() < 1.0, "capsule escaped sideways: {pos:?}");
            assert!(pos.y > 1.0, "capsule fell out of the chamber: {pos:?}");
            assert!(pos.y < 3.0, "capsule escaped upward: {pos:?}");
        }
    }

    #[test]
    fn activation_counts_each_capsule_once() {
        let mut r = rig();
        spawn(&mut r, 6);
        assert_eq!(activate(&mut r), 6);
        // Re-activation finds nothing left to flip
        assert_eq!(activate(&mut r), 0);
    }

    #[test]
    fn release_requires_activation() {
        let mut r = rig();
        spawn(&mut r, 3);
        let m = &r.machine;
        assert!(r
            .items
            .release(&mut r.physics, &mut r.world, m, &mut r.rng)
            .is_none());
        activate(&mut r);
        let m = &r.machine;
        assert!(r
            .items
            .release(&mut r.physics, &mut r.world, m, &mut r.rng)
            .is_some());
    }

    #[test]
    fn release_lifts_one_capsule_above_the_lid() {
        let mut r = rig();
        spawn(&mut r, 5);
        activate(&mut r);
        let m = &r.machine;
        let released = r
            .items
            .release(&mut r.physics, &mut r.world, m, &mut r.rng);
        assert!(released.is_some());
        assert_eq!(r.items.count_in_machine(&r.world, GachaponId(0)), 4);
        assert_eq!(r.items.live_count(&r.world), 5);

        let mut found = false;
        for (_, (item, body)) in r.world.query::<(&GachaponItem, &PhysicsBody)>().iter() {
            if item.released {
                let pos = r.physics.body_position(body.rigid_body).unwrap();
                assert!(pos.y >= 3.0, "released capsule not above the lid: {pos:?}");
                found = true;
            }
        }
        assert!(found);
    }

    #[test]
    fn release_retunes_damping_for_the_tumble() {
        let mut r = rig();
        spawn(&mut r, 1);
        activate(&mut r);
        let m = &r.machine;
        r.items
            .release(&mut r.physics, &mut r.world, m, &mut r.rng)
            .unwrap();
        for (_, (item, body)) in r.world.query::<(&GachaponItem, &PhysicsBody)>().iter() {
            assert!(item.released);
            let b = &r.physics.rigid_body_set[body.rigid_body];
            assert_eq!(b.linear_damping(), 0.3);
            assert_eq!(b.angular_damping(), 0.3);
        }
    }

    #[test]
    fn release_drains_the_machine_then_stops() {
        let mut r = rig();
        spawn(&mut r, 2);
        activate(&mut r);
        let m = &r.machine;
        assert!(r
            .items
            .release(&mut r.physics, &mut r.world, m, &mut r.rng)
            .is_some());
        assert!(r
            .items
            .release(&mut r.physics, &mut r.world, m, &mut r.rng)
            .is_some());
        // Empty machine: no-op, count unchanged
        assert!(r
            .items
            .release(&mut r.physics, &mut r.world, m, &mut r.rng)
            .is_none());
        assert_eq!(r.items.live_count(&r.world), 2);
        assert_eq!(r.items.stats.released, 2);
    }

    #[test]
    fn shuffle_wakes_resting_capsules() {
        let mut r = rig();
        spawn(&mut r, 10);
        for _ in 0..600 {
            r.physics.step(DT);
        }
        r.items
            .shuffle(&mut r.physics, &mut r.world, GachaponId(0), &mut r.rng);
        r.physics.step(DT);

        let mut moving = 0;
        for (_, (_, body)) in r.world.query::<(&GachaponItem, &PhysicsBody)>().iter() {
            let vel = r.physics.rigid_body_set[body.rigid_body].linvel();
            if vel.norm() > 0.05 {
                moving += 1;
            }
        }
        assert!(moving > 0, "no capsule moved after the shuffle");
    }

    #[test]
    fn far_and_fallen_capsules_are_culled() {
        let mut r = rig();
        spawn(&mut r, 3);
        let handles: Vec<_> = r
            .world
            .query::<(&GachaponItem, &PhysicsBody)>()
            .iter()
            .map(|(_, (_, body))| body.rigid_body)
            .collect();
        r.physics
            .set_body_position(handles[0], Vec3::new(150.0, 2.0, 0.0));
        r.physics
            .set_body_position(handles[1], Vec3::new(0.0, -20.0, 0.0));

        let culled = r.items.cull(&mut r.physics, &mut r.world);
        assert_eq!(culled, 2);
        assert_eq!(r.items.live_count(&r.world), 1);
        assert_eq!(r.items.stats.culled, 2);
        assert!(r.physics.rigid_body_set.get(handles[0]).is_none());

        // In-bounds capsules are never culled
        assert_eq!(r.items.cull(&mut r.physics, &mut r.world), 0);
        assert_eq!(r.items.live_count(&r.world), 1);
    }

    #[test]
    fn update_copies_pose_and_keeps_render_scale() {
        let mut r = rig();
        spawn(&mut r, 1);
        for _ in 0..30 {
            r.physics.step(DT);
        }
        r.items.update(&r.physics, &mut r.world, DT, 0.5);
        for (_, (transform, body, _)) in r
            .world
            .query::<(&Transform, &PhysicsBody, &GachaponItem)>()
            .iter()
        {
            let pos = r.physics.body_position(body.rigid_body).unwrap();
            // The idle animation may offset position slightly, never far
            assert!((transform.position - pos).length() < 0.2);
            assert!(transform.scale.x > 0.2 && transform.scale.x < 0.3);
        }
    }

    #[test]
    fn cleanup_machine_only_touches_that_machine() {
        let mut r = rig();
        let other = Gachapon::build(
            &mut r.physics,
            GachaponId(1),
            Vec3::new(10.0, 0.0, 0.0),
            1.0,
        );
        spawn(&mut r, 4);
        r.items.spawn_burst(
            &mut r.physics,
            &mut r.world,
            &other,
            Some(3),
            0,
            &mut r.rng,
        );
        r.items
            .cleanup_machine(&mut r.physics, &mut r.world, GachaponId(0));
        assert_eq!(r.items.live_count(&r.world), 3);
        assert_eq!(r.items.count_in_machine(&r.world, GachaponId(1)), 3);
    }

    #[test]
    fn despawn_all_clears_bodies_and_entities() {
        let mut r = rig();
        spawn(&mut r, 8);
        assert_eq!(r.physics.body_count(), 8);
        r.items.despawn_all(&mut r.physics, &mut r.world);
        assert_eq!(r.items.live_count(&r.world), 0);
        assert_eq!(r.physics.body_count(), 0);
    }
}
