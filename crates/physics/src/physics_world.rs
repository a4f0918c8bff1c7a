//! Physics world management with Rapier3D.

use crate::collision::CollisionGroup;
use engine_core::{Transform, Vec3};
use rapier3d::prelude::*;

const FIXED_TIMESTEP: f32 = 1.0 / 60.0;
const MAX_SUBSTEPS: u32 = 3;

fn groups(pair: (Group, Group)) -> InteractionGroups {
    InteractionGroups::new(pair.0, pair.1)
}

/// Collider shape for a dynamic prize item. The render mesh can be any
/// of the ten display shapes; the simulated proxy is one of these four.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemShape {
    Ball { radius: f32 },
    Cuboid { half_extents: Vec3 },
    Cylinder { half_height: f32, radius: f32 },
    Cone { half_height: f32, radius: f32 },
}

/// Tuning for a dynamic item body.
#[derive(Debug, Clone, Copy)]
pub struct ItemBodyDesc {
    pub position: Vec3,
    pub shape: ItemShape,
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub friction: f32,
    pub restitution: f32,
    pub angular_velocity: Vec3,
}

/// Main physics world containing all simulation state.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
    accumulator: f32,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create a new physics world with default gravity.
    pub fn new() -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = FIXED_TIMESTEP;
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: vector![0.0, -9.82, 0.0],
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            accumulator: 0.0,
        }
    }

    /// Advance the simulation by `dt` real seconds using fixed 1/60s
    /// substeps. At most [`MAX_SUBSTEPS`] substeps run per call; excess
    /// time is dropped so a long stall cannot spiral.
    pub fn step(&mut self, dt: f32) {
        self.accumulator += dt;
        let mut substeps = 0;
        while self.accumulator >= FIXED_TIMESTEP && substeps < MAX_SUBSTEPS {
            self.physics_pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.island_manager,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.rigid_body_set,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                &mut self.ccd_solver,
                Some(&mut self.query_pipeline),
                &(),
                &(),
            );
            self.accumulator -= FIXED_TIMESTEP;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS && self.accumulator >= FIXED_TIMESTEP {
            log::debug!("Frame stall: dropping {:.3}s of simulation time", self.accumulator);
            self.accumulator = 0.0;
        }
    }

    /// Update query pipeline for raycasting without stepping.
    pub fn update_query_pipeline(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Add a static cuboid collider with no parent body. `half_extents`
    /// are local X, Y, Z half sizes.
    pub fn add_static_cuboid(&mut self, translation: Vec3, half_extents: Vec3) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(vector![translation.x, translation.y, translation.z])
            .collision_groups(groups(CollisionGroup::environment()))
            .build();
        self.collider_set.insert(collider)
    }

    /// Add a static sphere collider with no parent body.
    pub fn add_static_ball(&mut self, translation: Vec3, radius: f32) -> ColliderHandle {
        let collider = ColliderBuilder::ball(radius)
            .translation(vector![translation.x, translation.y, translation.z])
            .collision_groups(groups(CollisionGroup::environment()))
            .build();
        self.collider_set.insert(collider)
    }

    /// Add a contact-free cuboid volume in the interact group. Only the
    /// picking ray sees it.
    pub fn add_interact_cuboid(&mut self, translation: Vec3, half_extents: Vec3) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(vector![translation.x, translation.y, translation.z])
            .collision_groups(groups(CollisionGroup::interact()))
            .build();
        self.collider_set.insert(collider)
    }

    /// Add a dynamic item body with its collider. Returns both handles.
    pub fn add_item_body(&mut self, desc: &ItemBodyDesc) -> (RigidBodyHandle, ColliderHandle) {
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![desc.position.x, desc.position.y, desc.position.z])
            .linear_damping(desc.linear_damping)
            .angular_damping(desc.angular_damping)
            .angvel(vector![
                desc.angular_velocity.x,
                desc.angular_velocity.y,
                desc.angular_velocity.z
            ])
            .build();
        let body_handle = self.rigid_body_set.insert(body);

        let builder = match desc.shape {
            ItemShape::Ball { radius } => ColliderBuilder::ball(radius),
            ItemShape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            ItemShape::Cylinder {
                half_height,
                radius,
            } => ColliderBuilder::cylinder(half_height, radius),
            ItemShape::Cone {
                half_height,
                radius,
            } => ColliderBuilder::cone(half_height, radius),
        };
        let collider = builder
            .mass(desc.mass)
            .friction(desc.friction)
            .restitution(desc.restitution)
            .collision_groups(groups(CollisionGroup::item()))
            .build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);
        (body_handle, collider_handle)
    }

    /// Get the transform of a rigid body.
    pub fn body_transform(&self, handle: RigidBodyHandle) -> Option<Transform> {
        self.rigid_body_set.get(handle).map(|body| {
            let pos = body.translation();
            let rot = body.rotation();
            Transform {
                position: Vec3::new(pos.x, pos.y, pos.z),
                rotation: glam::Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w),
                scale: Vec3::ONE,
            }
        })
    }

    /// Get just the position of a rigid body.
    pub fn body_position(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set
            .get(handle)
            .map(|body| {
                let pos = body.translation();
                Vec3::new(pos.x, pos.y, pos.z)
            })
    }

    /// Teleport a dynamic body, waking it.
    pub fn set_body_position(&mut self, handle: RigidBodyHandle, position: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_translation(vector![position.x, position.y, position.z], true);
        }
    }

    /// Overwrite a body's linear velocity.
    pub fn set_body_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_linvel(vector![velocity.x, velocity.y, velocity.z], true);
        }
    }

    /// Overwrite a body's angular velocity.
    pub fn set_body_angular_velocity(&mut self, handle: RigidBodyHandle, angvel: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_angvel(vector![angvel.x, angvel.y, angvel.z], true);
        }
    }

    /// Retune linear damping on a live body.
    pub fn set_linear_damping(&mut self, handle: RigidBodyHandle, damping: f32) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_linear_damping(damping);
        }
    }

    /// Retune angular damping on a live body.
    pub fn set_angular_damping(&mut self, handle: RigidBodyHandle, damping: f32) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_angular_damping(damping);
        }
    }

    /// Apply an impulse to a dynamic body.
    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.apply_impulse(vector![impulse.x, impulse.y, impulse.z], true);
        }
    }

    /// Remove a collider by its handle.
    pub fn remove_collider(&mut self, handle: ColliderHandle) {
        self.collider_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.rigid_body_set,
            true,
        );
    }

    /// Remove a rigid body and its colliders.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    /// Number of live rigid bodies.
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_desc(position: Vec3) -> ItemBodyDesc {
        ItemBodyDesc {
            position,
            shape: ItemShape::Ball { radius: 0.25 },
            mass: 0.4,
            linear_damping: 0.3,
            angular_damping: 0.5,
            friction: 0.5,
            restitution: 0.2,
            angular_velocity: Vec3::ZERO,
        }
    }

    #[test]
    fn dynamic_body_falls_under_gravity() {
        let mut world = PhysicsWorld::new();
        let (body, _) = world.add_item_body(&item_desc(Vec3::new(0.0, 10.0, 0.0)));
        for _ in 0..60 {
            world.step(FIXED_TIMESTEP);
        }
        let pos = world.body_position(body).unwrap();
        assert!(pos.y < 10.0 - 2.0, "body barely fell: {pos:?}");
    }

    #[test]
    fn item_rests_on_static_floor() {
        let mut world = PhysicsWorld::new();
        world.add_static_cuboid(Vec3::new(0.0, -0.5, 0.0), Vec3::new(20.0, 0.5, 20.0));
        let (body, _) = world.add_item_body(&item_desc(Vec3::new(0.0, 2.0, 0.0)));
        for _ in 0..240 {
            world.step(FIXED_TIMESTEP);
        }
        let pos = world.body_position(body).unwrap();
        assert!(pos.y > 0.0, "item fell through the floor: {pos:?}");
        assert!(pos.y < 0.5, "item never settled: {pos:?}");
    }

    #[test]
    fn step_caps_substeps_per_call() {
        let mut world = PhysicsWorld::new();
        let (body, _) = world.add_item_body(&item_desc(Vec3::new(0.0, 100.0, 0.0)));
        // A one-second stall simulates at most 3 substeps, not 60.
        world.step(1.0);
        let pos = world.body_position(body).unwrap();
        let max_fall = 0.5 * 9.82 * (3.0 * FIXED_TIMESTEP) * (3.0 * FIXED_TIMESTEP) + 0.1;
        assert!(100.0 - pos.y <= max_fall, "too many substeps ran: {pos:?}");
    }

    #[test]
    fn interact_volume_does_not_block_items() {
        let mut world = PhysicsWorld::new();
        world.add_interact_cuboid(Vec3::new(0.0, 1.0, 0.0), Vec3::new(5.0, 0.5, 5.0));
        let (body, _) = world.add_item_body(&item_desc(Vec3::new(0.0, 3.0, 0.0)));
        for _ in 0..180 {
            world.step(FIXED_TIMESTEP);
        }
        let pos = world.body_position(body).unwrap();
        assert!(pos.y < 0.0, "interact volume blocked the fall: {pos:?}");
    }
}
