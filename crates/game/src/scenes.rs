//! Scene construction, the mesh store, and scene disposal.
//!
//! Two scenes exist: a street outside the shop and the shop interior
//! with the machines. Both are laid out in the same world frame, so the
//! player rig carries over a swap without being moved. Scenes own their
//! static colliders and machines; animated display pieces and capsules
//! are ECS entities tagged with the scene generation so disposal can
//! find them.

use std::collections::HashMap;

use engine_core::{NodeColor, SceneMember, Transform, Vec3, World};
use physics::{ColliderHandle, PhysicsWorld};
use procgen::{
    behavior_for, cuboid, hsl_to_rgb, plane, shape_mesh, uv_sphere, MeshData, ShapeBehavior,
    ShapeKind,
};
use rand::Rng;
use renderer::Mesh;

use crate::gachapon::{Gachapon, GachaponId};
use crate::interact::InteractionResolver;
use crate::items::ItemManager;
use crate::labels::LabelLoader;
use crate::transition::SwapTarget;

/// Keys into the mesh store. Unit-sized geometry, scaled per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKey {
    UnitCube,
    UnitSphere,
    Ground,
    Shape(ShapeKind),
    Label(u32),
}

/// One static drawable in a scene.
#[derive(Debug, Clone, Copy)]
pub struct SceneNode {
    pub mesh: MeshKey,
    pub transform: Transform,
    pub color: [f32; 4],
    pub transparent: bool,
}

/// An animated pedestal shape. `rest` is the pose the behavior offsets
/// from each frame.
#[derive(Debug, Clone, Copy)]
pub struct DisplayPiece {
    pub kind: ShapeKind,
    pub behavior: ShapeBehavior,
    pub rest: Transform,
}

/// CPU mesh data with lazily uploaded GPU buffers.
pub struct MeshStore {
    entries: HashMap<MeshKey, MeshEntry>,
    next_label: u32,
}

struct MeshEntry {
    data: MeshData,
    gpu: Option<Mesh>,
}

impl Default for MeshStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshStore {
    /// Build the store with every fixed mesh pre-generated on the CPU.
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(MeshKey::UnitCube, entry(cuboid(Vec3::splat(0.5))));
        entries.insert(MeshKey::UnitSphere, entry(uv_sphere(0.5, 24, 16)));
        entries.insert(MeshKey::Ground, entry(plane(0.5, 0.5)));
        for kind in ShapeKind::ALL {
            entries.insert(MeshKey::Shape(kind), entry(shape_mesh(kind, 1.0)));
        }
        Self {
            entries,
            next_label: 0,
        }
    }

    /// Store a finished label mesh and return its key.
    pub fn insert_label(&mut self, data: MeshData) -> MeshKey {
        let key = MeshKey::Label(self.next_label);
        self.next_label += 1;
        self.entries.insert(key, entry(data));
        key
    }

    /// Drop all label meshes. Called on scene swap; fixed meshes are
    /// shared across scenes and stay.
    pub fn clear_labels(&mut self) {
        self.entries.retain(|key, _| !matches!(key, MeshKey::Label(_)));
    }

    /// Get the GPU mesh for a key, uploading on first use.
    pub fn gpu(&mut self, device: &wgpu::Device, key: MeshKey) -> Option<&Mesh> {
        let entry = self.entries.get_mut(&key)?;
        if entry.gpu.is_none() {
            entry.gpu = Some(Mesh::upload(device, &entry.data));
        }
        entry.gpu.as_ref()
    }
}

fn entry(data: MeshData) -> MeshEntry {
    MeshEntry { data, gpu: None }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneId {
    Outside,
    Inside,
}

/// A fully built scene: drawables, machines, physics handles, and the
/// spawn used when the game first starts in it.
pub struct Scene {
    pub id: SceneId,
    pub generation: u32,
    pub clear_color: [f32; 4],
    pub nodes: Vec<SceneNode>,
    pub gachapons: Vec<Gachapon>,
    pub spawn_position: Vec3,
    pub spawn_yaw: f32,
    pub light_position: Vec3,
    pub light_color: [f32; 4],
    pub light_follows_camera: bool,
    colliders: Vec<ColliderHandle>,
}

/// Builds scenes and tears them down, handing out one generation per
/// build so stale async work can be recognized.
#[derive(Debug, Default)]
pub struct SceneRegistry {
    generation: u32,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the scene for `target` into the physics world and ECS.
    pub fn build<R: Rng>(
        &mut self,
        physics: &mut PhysicsWorld,
        world: &mut World,
        resolver: &mut InteractionResolver,
        labels: &LabelLoader,
        items: &mut ItemManager,
        rng: &mut R,
        target: SwapTarget,
    ) -> Scene {
        self.generation += 1;
        resolver.clear();
        let scene = match target {
            SwapTarget::Outside => build_outside(physics, resolver, self.generation),
            SwapTarget::Inside => {
                build_inside(physics, world, resolver, labels, items, rng, self.generation)
            }
        };
        physics.update_query_pipeline();
        log::info!(
            "Built scene {:?} (generation {})",
            scene.id,
            scene.generation
        );
        scene
    }

    /// Remove everything a scene put into the physics world and ECS.
    pub fn dispose(
        &mut self,
        physics: &mut PhysicsWorld,
        world: &mut World,
        items: &mut ItemManager,
        scene: &Scene,
    ) {
        for &collider in &scene.colliders {
            physics.remove_collider(collider);
        }
        for machine in &scene.gachapons {
            for collider in machine.all_colliders() {
                physics.remove_collider(collider);
            }
            items.cleanup_machine(physics, world, machine.id);
        }
        // Sweep anything the per-machine pass could not attribute
        items.despawn_all(physics, world);

        let doomed: Vec<_> = world
            .query::<&SceneMember>()
            .iter()
            .filter(|(_, member)| member.generation == scene.generation)
            .map(|(entity, _)| entity)
            .collect();
        for entity in doomed {
            let _ = world.despawn(entity);
        }
        log::info!("Disposed scene {:?}", scene.id);
    }
}

fn node(mesh: MeshKey, position: Vec3, scale: Vec3, color: [f32; 4]) -> SceneNode {
    SceneNode {
        mesh,
        transform: Transform {
            position,
            scale,
            ..Default::default()
        },
        color,
        transparent: false,
    }
}

/// Street outside the shop: ground, facade, trees, and the entry door.
fn build_outside(
    physics: &mut PhysicsWorld,
    resolver: &mut InteractionResolver,
    generation: u32,
) -> Scene {
    let mut nodes = Vec::new();
    let mut colliders = Vec::new();

    nodes.push(node(
        MeshKey::Ground,
        Vec3::ZERO,
        Vec3::new(120.0, 1.0, 120.0),
        [0.32, 0.45, 0.3, 1.0],
    ));
    colliders.push(physics.add_static_cuboid(
        Vec3::new(0.0, -0.1, 0.0),
        Vec3::new(60.0, 0.1, 60.0),
    ));

    // Shop facade
    let wall = [0.85, 0.8, 0.7, 1.0];
    nodes.push(node(
        MeshKey::UnitCube,
        Vec3::new(0.0, 2.0, -10.0),
        Vec3::new(10.0, 4.0, 8.0),
        wall,
    ));
    nodes.push(node(
        MeshKey::UnitCube,
        Vec3::new(0.0, 4.4, -10.0),
        Vec3::new(10.6, 0.8, 8.6),
        [0.5, 0.25, 0.2, 1.0],
    ));
    colliders.push(physics.add_static_cuboid(
        Vec3::new(0.0, 2.0, -10.0),
        Vec3::new(5.0, 2.0, 4.0),
    ));

    // Entry door on the front face
    let door_pos = Vec3::new(0.0, 1.2, -5.95);
    nodes.push(node(
        MeshKey::UnitCube,
        door_pos,
        Vec3::new(1.6, 2.4, 0.1),
        [0.35, 0.2, 0.12, 1.0],
    ));
    let door = physics.add_interact_cuboid(door_pos, Vec3::new(0.8, 1.2, 0.1));
    colliders.push(door);
    resolver.register_door(door, SwapTarget::Inside);

    // Trees along the street
    for (x, z) in [(-8.0, -4.0), (8.0, -3.0), (-6.0, 5.0), (7.0, 6.0)] {
        let base = Vec3::new(x, 0.0, z);
        nodes.push(node(
            MeshKey::UnitCube,
            base + Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.4, 2.0, 0.4),
            [0.4, 0.28, 0.18, 1.0],
        ));
        nodes.push(node(
            MeshKey::UnitSphere,
            base + Vec3::new(0.0, 2.8, 0.0),
            Vec3::splat(2.4),
            [0.25, 0.5, 0.22, 1.0],
        ));
        colliders.push(physics.add_static_cuboid(
            base + Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.2, 1.0, 0.2),
        ));
    }

    Scene {
        id: SceneId::Outside,
        generation,
        clear_color: [0.53, 0.7, 0.92, 1.0],
        nodes,
        gachapons: Vec::new(),
        spawn_position: Vec3::new(0.0, 0.0, 2.0),
        spawn_yaw: 0.0,
        light_position: Vec3::new(20.0, 30.0, 10.0),
        light_color: [1.0, 0.98, 0.92, 60.0],
        light_follows_camera: false,
        colliders,
    }
}

/// Shop interior: room shell, three stocked machines, ten pedestal
/// displays, and the exit door.
///
/// The room extends past the facade footprint toward positive z so that
/// a player standing at the entry door outside is standing inside the
/// room after the swap.
fn build_inside<R: Rng>(
    physics: &mut PhysicsWorld,
    world: &mut World,
    resolver: &mut InteractionResolver,
    labels: &LabelLoader,
    items: &mut ItemManager,
    rng: &mut R,
    generation: u32,
) -> Scene {
    let mut nodes = Vec::new();
    let mut colliders = Vec::new();

    let half_x = 8.0;
    let half_z = 10.0;
    // Front wall at z = 4, back wall at z = -16
    let center_z = -6.0;
    let height = 5.0;
    let wall_color = [0.45, 0.42, 0.5, 1.0];

    nodes.push(node(
        MeshKey::Ground,
        Vec3::new(0.0, 0.0, center_z),
        Vec3::new(2.0 * half_x, 1.0, 2.0 * half_z),
        [0.35, 0.32, 0.38, 1.0],
    ));
    colliders.push(physics.add_static_cuboid(
        Vec3::new(0.0, -0.1, center_z),
        Vec3::new(half_x, 0.1, half_z),
    ));

    // Walls and ceiling
    for (pos, size) in [
        (
            Vec3::new(0.0, height / 2.0, center_z - half_z),
            Vec3::new(half_x, height / 2.0, 0.1),
        ),
        (
            Vec3::new(0.0, height / 2.0, center_z + half_z),
            Vec3::new(half_x, height / 2.0, 0.1),
        ),
        (
            Vec3::new(-half_x, height / 2.0, center_z),
            Vec3::new(0.1, height / 2.0, half_z),
        ),
        (
            Vec3::new(half_x, height / 2.0, center_z),
            Vec3::new(0.1, height / 2.0, half_z),
        ),
        (
            Vec3::new(0.0, height, center_z),
            Vec3::new(half_x, 0.1, half_z),
        ),
    ] {
        nodes.push(node(MeshKey::UnitCube, pos, size * 2.0, wall_color));
        colliders.push(physics.add_static_cuboid(pos, size));
    }

    // Stocked machines along the back wall
    let mut gachapons = Vec::new();
    for (i, (x, z, scale)) in [(-4.0, -13.0, 1.0), (0.0, -13.5, 1.2), (4.0, -13.0, 0.9)]
        .into_iter()
        .enumerate()
    {
        let machine = Gachapon::build(
            physics,
            GachaponId(i as u32),
            Vec3::new(x, 0.0, z),
            scale,
        );
        resolver.register_machine(machine.body_volume, machine.button_volume, machine.id);
        items.spawn_burst(physics, world, &machine, None, generation, rng);

        // "Click Me!" floats over the button while the mesh builds
        let label_pos = machine.position + Vec3::new(0.0, 1.35, 1.2) * scale;
        labels.request(
            "Click Me!",
            generation,
            Transform::from_position_scale(label_pos, scale),
            [1.0, 1.0, 1.0, 1.0],
        );
        gachapons.push(machine);
    }

    // Pedestal displays along the side walls
    for (i, kind) in ShapeKind::ALL.into_iter().enumerate() {
        let side = if i % 2 == 0 { -1.0 } else { 1.0 };
        let z = -12.0 + (i / 2) as f32 * 2.8;
        let base = Vec3::new(side * (half_x - 1.2), 0.0, z);

        nodes.push(node(
            MeshKey::UnitCube,
            base + Vec3::new(0.0, 0.5, 0.0),
            Vec3::new(0.6, 1.0, 0.6),
            [0.25, 0.25, 0.28, 1.0],
        ));
        colliders.push(physics.add_static_cuboid(
            base + Vec3::new(0.0, 0.5, 0.0),
            Vec3::new(0.3, 0.5, 0.3),
        ));

        let rest = Transform {
            position: base + Vec3::new(0.0, 1.45, 0.0),
            scale: Vec3::splat(0.55),
            ..Default::default()
        };
        let rgb = hsl_to_rgb(0.6 + 0.3 * i as f32 / 9.0, 0.85, 0.6);
        world.spawn((
            rest,
            DisplayPiece {
                kind,
                behavior: behavior_for(kind),
                rest,
            },
            NodeColor([rgb[0], rgb[1], rgb[2], 1.0]),
            SceneMember::new(generation),
        ));
    }

    // Exit door on the front wall
    let door_pos = Vec3::new(0.0, 1.2, center_z + half_z - 0.05);
    nodes.push(node(
        MeshKey::UnitCube,
        door_pos,
        Vec3::new(1.6, 2.4, 0.1),
        [0.35, 0.2, 0.12, 1.0],
    ));
    let door = physics.add_interact_cuboid(door_pos, Vec3::new(0.8, 1.2, 0.1));
    colliders.push(door);
    resolver.register_door(door, SwapTarget::Outside);

    Scene {
        id: SceneId::Inside,
        generation,
        clear_color: [0.08, 0.07, 0.1, 1.0],
        nodes,
        gachapons,
        spawn_position: Vec3::new(0.0, 0.0, 0.0),
        spawn_yaw: 0.0,
        light_position: Vec3::new(0.0, 3.2, 0.0),
        light_color: [1.0, 0.95, 0.88, 12.0],
        light_follows_camera: true,
        colliders,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interact::Interaction;
    use rand::SeedableRng;

    struct Rig {
        physics: PhysicsWorld,
        world: World,
        resolver: InteractionResolver,
        labels: LabelLoader,
        registry: SceneRegistry,
        items: ItemManager,
        rng: rand::rngs::StdRng,
    }

    fn rig() -> Rig {
        let mut items = ItemManager::new();
        items.set_prize_amount(4);
        Rig {
            physics: PhysicsWorld::new(),
            world: World::new(),
            resolver: InteractionResolver::new(),
            labels: LabelLoader::new(),
            registry: SceneRegistry::new(),
            items,
            rng: rand::rngs::StdRng::seed_from_u64(11),
        }
    }

    fn build(r: &mut Rig, target: SwapTarget) -> Scene {
        r.registry.build(
            &mut r.physics,
            &mut r.world,
            &mut r.resolver,
            &r.labels,
            &mut r.items,
            &mut r.rng,
            target,
        )
    }

    #[test]
    fn outside_door_leads_inside() {
        let mut r = rig();
        let scene = build(&mut r, SwapTarget::Outside);
        assert_eq!(scene.id, SceneId::Outside);
        assert!(scene.gachapons.is_empty());

        // Look at the shop door from the spawn point
        let hit = r.resolver.resolve(
            &r.physics,
            Vec3::new(0.0, 1.2, 2.0),
            Vec3::new(0.0, 0.0, -1.0),
        );
        assert_eq!(hit, Some(Interaction::Door(SwapTarget::Inside)));
    }

    #[test]
    fn inside_scene_has_stocked_machines_and_displays() {
        let mut r = rig();
        let scene = build(&mut r, SwapTarget::Inside);
        assert_eq!(scene.gachapons.len(), 3);
        for machine in &scene.gachapons {
            assert_eq!(r.items.count_in_machine(&r.world, machine.id), 4);
        }
        let displays = r.world.query::<&DisplayPiece>().iter().count();
        assert_eq!(displays, 10);
        assert!(scene.light_follows_camera);
    }

    #[test]
    fn entry_spot_is_inside_the_room_after_a_swap() {
        let mut r = rig();
        let outside = build(&mut r, SwapTarget::Outside);
        // Where a player would stand to click the entry door
        let standing = Vec3::new(0.0, 1.7, -4.5);
        let (physics, world, items) = (&mut r.physics, &mut r.world, &mut r.items);
        r.registry.dispose(physics, world, items, &outside);
        let _inside = build(&mut r, SwapTarget::Inside);

        // The spot must be within the interior walls
        assert!(standing.x.abs() < 8.0);
        assert!(standing.z < 4.0 && standing.z > -16.0);
        // And the exit door must be reachable by turning around
        let hit = r
            .resolver
            .resolve(&r.physics, standing, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(hit, Some(Interaction::Door(SwapTarget::Outside)));
    }

    #[test]
    fn machine_button_is_clickable_from_standing_height() {
        let mut r = rig();
        let scene = build(&mut r, SwapTarget::Inside);
        let machine = &scene.gachapons[0];
        let origin = machine.position + Vec3::new(0.0, 0.85 * machine.scale, 4.0);
        let hit = r
            .resolver
            .resolve(&r.physics, origin, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(
            hit,
            Some(Interaction::Machine {
                id: machine.id,
                button: true,
            })
        );
    }

    #[test]
    fn dispose_clears_colliders_entities_and_capsules() {
        let mut r = rig();
        let scene = build(&mut r, SwapTarget::Inside);
        assert!(r.physics.collider_set.len() > 0);
        assert_eq!(r.items.live_count(&r.world), 12);

        let (physics, world, items) = (&mut r.physics, &mut r.world, &mut r.items);
        r.registry.dispose(physics, world, items, &scene);
        assert_eq!(r.physics.collider_set.len(), 0);
        assert_eq!(r.world.query::<&DisplayPiece>().iter().count(), 0);
        assert_eq!(r.items.live_count(&r.world), 0);
    }

    #[test]
    fn generations_are_unique_per_build() {
        let mut r = rig();
        let a = build(&mut r, SwapTarget::Outside);
        let b = build(&mut r, SwapTarget::Inside);
        assert_ne!(a.generation, b.generation);
    }

    #[test]
    fn mesh_store_holds_every_scene_key() {
        let store = MeshStore::new();
        for key in [MeshKey::UnitCube, MeshKey::UnitSphere, MeshKey::Ground] {
            assert!(store.entries.contains_key(&key));
        }
        for kind in ShapeKind::ALL {
            assert!(store.entries.contains_key(&MeshKey::Shape(kind)));
        }
        assert!(!store.entries.contains_key(&MeshKey::Label(0)));
    }

    #[test]
    fn labels_clear_without_touching_fixed_meshes() {
        let mut store = MeshStore::new();
        let key = store.insert_label(cuboid(Vec3::splat(0.1)));
        assert!(store.entries.contains_key(&key));
        store.clear_labels();
        assert!(!store.entries.contains_key(&key));
        assert!(store.entries.contains_key(&MeshKey::UnitCube));
    }
}
