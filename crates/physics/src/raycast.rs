//! Raycasting for center-screen picking.

use crate::collision::CollisionGroup;
use crate::PhysicsWorld;
use engine_core::Vec3;
use rapier3d::prelude::*;

/// Result of a raycast query.
#[derive(Debug, Clone, Copy)]
pub struct RaycastHit {
    /// The collider that was hit.
    pub collider: ColliderHandle,
    /// Distance along the ray to the hit point.
    pub distance: f32,
    /// World position of the hit.
    pub point: Vec3,
    /// Surface normal at the hit point.
    pub normal: Vec3,
}

impl PhysicsWorld {
    /// Cast a ray and return the first hit.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RaycastHit> {
        self.raycast_with_filter(origin, direction, max_distance, QueryFilter::default())
    }

    /// Cast a ray restricted to colliders in the given groups. Used to
    /// pick interact volumes without the ray stopping on walls or items.
    pub fn raycast_groups(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        memberships: Group,
    ) -> Option<RaycastHit> {
        let filter = QueryFilter::default()
            .groups(InteractionGroups::new(CollisionGroup::ray_membership(), memberships));
        self.raycast_with_filter(origin, direction, max_distance, filter)
    }

    /// Cast a ray and collect every hit in the given groups, nearest
    /// first. Interact volumes can nest (a button inside a machine), so
    /// pickers need more than the first intersection.
    pub fn raycast_groups_all(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        memberships: Group,
    ) -> Vec<RaycastHit> {
        let filter = QueryFilter::default()
            .groups(InteractionGroups::new(CollisionGroup::ray_membership(), memberships));
        let ray = Ray::new(
            point![origin.x, origin.y, origin.z],
            vector![direction.x, direction.y, direction.z],
        );

        let mut hits = Vec::new();
        self.query_pipeline.intersections_with_ray(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            max_distance,
            true,
            filter,
            |collider, intersection| {
                let point = ray.point_at(intersection.time_of_impact);
                hits.push(RaycastHit {
                    collider,
                    distance: intersection.time_of_impact,
                    point: Vec3::new(point.x, point.y, point.z),
                    normal: Vec3::new(
                        intersection.normal.x,
                        intersection.normal.y,
                        intersection.normal.z,
                    ),
                });
                true
            },
        );
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn raycast_with_filter(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: QueryFilter,
    ) -> Option<RaycastHit> {
        let ray = Ray::new(
            point![origin.x, origin.y, origin.z],
            vector![direction.x, direction.y, direction.z],
        );

        self.query_pipeline
            .cast_ray_and_get_normal(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance,
                true,
                filter,
            )
            .map(|(collider, intersection)| {
                let point = ray.point_at(intersection.time_of_impact);
                RaycastHit {
                    collider,
                    distance: intersection.time_of_impact,
                    point: Vec3::new(point.x, point.y, point.z),
                    normal: Vec3::new(
                        intersection.normal.x,
                        intersection.normal.y,
                        intersection.normal.z,
                    ),
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionGroup;

    #[test]
    fn ray_hits_static_cuboid() {
        let mut world = PhysicsWorld::new();
        let handle = world.add_static_cuboid(Vec3::new(0.0, 0.0, -5.0), Vec3::splat(1.0));
        world.update_query_pipeline();

        let hit = world
            .raycast(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 50.0)
            .expect("ray should hit the cuboid");
        assert_eq!(hit.collider, handle);
        assert!((hit.distance - 4.0).abs() < 1e-3);
        assert!((hit.normal - Vec3::Z).length() < 1e-3);
    }

    #[test]
    fn grouped_ray_reaches_a_lone_interact_volume() {
        let mut world = PhysicsWorld::new();
        let target = world.add_interact_cuboid(Vec3::new(0.0, 0.0, -8.0), Vec3::splat(1.0));
        world.update_query_pipeline();

        let hit = world
            .raycast_groups(
                Vec3::ZERO,
                Vec3::new(0.0, 0.0, -1.0),
                50.0,
                CollisionGroup::interact_filter(),
            )
            .expect("interact volume should answer the picking ray");
        assert_eq!(hit.collider, target);
    }

    #[test]
    fn group_filter_skips_environment() {
        let mut world = PhysicsWorld::new();
        // Wall in front of the interact volume
        world.add_static_cuboid(Vec3::new(0.0, 0.0, -3.0), Vec3::splat(1.0));
        let target = world.add_interact_cuboid(Vec3::new(0.0, 0.0, -8.0), Vec3::splat(1.0));
        world.update_query_pipeline();

        let hit = world
            .raycast_groups(
                Vec3::ZERO,
                Vec3::new(0.0, 0.0, -1.0),
                50.0,
                CollisionGroup::interact_filter(),
            )
            .expect("filtered ray should reach the interact volume");
        assert_eq!(hit.collider, target);
        assert!((hit.distance - 7.0).abs() < 1e-3);
    }

    #[test]
    fn collect_all_returns_nested_volumes_nearest_first() {
        let mut world = PhysicsWorld::new();
        let outer = world.add_interact_cuboid(Vec3::new(0.0, 0.0, -6.0), Vec3::splat(2.0));
        // Smaller volume fully inside the outer one
        let inner = world.add_interact_cuboid(Vec3::new(0.0, 0.0, -6.0), Vec3::splat(0.5));
        world.update_query_pipeline();

        let hits = world.raycast_groups_all(
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, -1.0),
            50.0,
            CollisionGroup::interact_filter(),
        );
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].collider, outer);
        assert_eq!(hits[1].collider, inner);
        assert!(hits[0].distance < hits[1].distance);
    }

    #[test]
    fn ray_misses_beyond_max_distance() {
        let mut world = PhysicsWorld::new();
        world.add_static_cuboid(Vec3::new(0.0, 0.0, -20.0), Vec3::splat(1.0));
        world.update_query_pipeline();
        assert!(world
            .raycast(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 10.0)
            .is_none());
    }
}
