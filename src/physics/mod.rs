//! CPU-based 2D physics: chunked grid broadphase, narrowphase, impulse resolver
//! and ray queries.
//!
//! # Architecture
//!
//! Every tick runs the same fixed pipeline (see [`PIPELINE`]):
//!
//! 1. Insert new bodies into the grid
//! 2. Integrate velocities into transforms
//! 3. Update grid membership of moved bodies
//! 4. Sweep-and-prune each chunk into the global pair list
//! 5. Detect and resolve contacts pair by pair
//! 6. Recast rays
//! 7. Publish statistics and reset the pair list

pub mod broadphase;
pub mod collider;
pub mod contact;
pub mod error;
pub mod layers;
pub mod math;
pub mod narrowphase;
pub mod raycast;
pub mod rigid_body;
pub mod solver;

use glam::Vec2;
use hecs::Without;

use crate::ecs::components::physics::{direction_from_rotation, Collider, RigidBody, StaticTag};
use crate::ecs::components::transform::Transform;
use crate::ecs::World;

pub use self::broadphase::{Broadphase, BroadphaseStats, SpatialRef};
pub use self::collider::Aabb;
pub use self::contact::{ContactInfo, ContactManifold};
pub use self::error::{LayerError, PhysicsError};
pub use self::layers::CollisionMatrix;
pub use self::math::EPSILON;
pub use self::raycast::RayHit;

/// Configuration for the physics simulation.
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    /// Edge length of a grid cell. Default: 50.
    pub cell_size: f32,
    /// Share of the penetration removed by positional correction each tick.
    /// Default: 0.5.
    pub correction_factor: f32,
    /// Fixed timestep for [`PhysicsWorld::step`] in seconds. Default: 1/60.
    pub fixed_timestep: f64,
    /// Maximum number of sub-steps per [`PhysicsWorld::step`]. Default: 4.
    pub max_substeps: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            cell_size: 50.0,
            correction_factor: 0.5,
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 4,
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(PhysicsError::InvalidCellSize(self.cell_size));
        }
        if !(0.0..=1.0).contains(&self.correction_factor) {
            return Err(PhysicsError::InvalidCorrectionFactor(self.correction_factor));
        }
        if !self.fixed_timestep.is_finite() || self.fixed_timestep <= 0.0 {
            return Err(PhysicsError::InvalidTimestep(self.fixed_timestep));
        }
        Ok(())
    }
}

/// One stage of a simulation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Insert,
    Integrate,
    Update,
    Pairs,
    Resolve,
    Rays,
    Reset,
}

/// Stage order of every tick.
pub const PIPELINE: [Stage; 7] = [
    Stage::Insert,
    Stage::Integrate,
    Stage::Update,
    Stage::Pairs,
    Stage::Resolve,
    Stage::Rays,
    Stage::Reset,
];

/// The main physics world managing simulation state.
pub struct PhysicsWorld {
    config: PhysicsConfig,
    matrix: CollisionMatrix,
    accumulator: f64,
    broadphase: Broadphase,
    contacts: Vec<ContactManifold>,
    stats: BroadphaseStats,
}

impl PhysicsWorld {
    /// Create a new physics world with the given configuration and layers.
    pub fn new(config: PhysicsConfig, matrix: CollisionMatrix) -> Result<Self, PhysicsError> {
        config.validate()?;
        tracing::debug!(
            cell_size = config.cell_size,
            correction_factor = config.correction_factor,
            layers = matrix.len(),
            "created physics world"
        );
        Ok(Self {
            broadphase: Broadphase::new(config.cell_size),
            config,
            matrix,
            accumulator: 0.0,
            contacts: Vec::new(),
            stats: BroadphaseStats::default(),
        })
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn matrix(&self) -> &CollisionMatrix {
        &self.matrix
    }

    pub fn broadphase(&self) -> &Broadphase {
        &self.broadphase
    }

    /// Contacts resolved during the last tick, in resolution order.
    pub fn contacts(&self) -> &[ContactManifold] {
        &self.contacts
    }

    /// Grid statistics published at the end of the last tick.
    pub fn stats(&self) -> BroadphaseStats {
        self.stats
    }

    /// Step the simulation forward by `delta_time` seconds.
    ///
    /// Uses a fixed timestep accumulator; at most `max_substeps` ticks run per
    /// call.
    pub fn step(&mut self, world: &mut World, delta_time: f64) {
        self.accumulator += delta_time;

        let mut substeps = 0u32;
        while self.accumulator >= self.config.fixed_timestep && substeps < self.config.max_substeps
        {
            self.tick(world, self.config.fixed_timestep as f32);
            self.accumulator -= self.config.fixed_timestep;
            substeps += 1;
        }

        // Clamp accumulator to avoid spiral of death
        if self.accumulator > self.config.fixed_timestep * self.config.max_substeps as f64 {
            self.accumulator = 0.0;
        }
    }

    /// Run one full pipeline pass with timestep `dt`.
    pub fn tick(&mut self, world: &mut World, dt: f32) {
        for stage in PIPELINE {
            match stage {
                Stage::Insert => self.insert_new_bodies(world),
                Stage::Integrate => rigid_body::integrate_velocities(world, dt),
                Stage::Update => self.update_moved_bodies(world),
                Stage::Pairs => {
                    self.broadphase.compute_pairs(&self.matrix);
                }
                Stage::Resolve => self.resolve_pairs(world, dt),
                Stage::Rays => raycast::update_rays(world, &self.broadphase, &self.matrix),
                Stage::Reset => self.reset(world),
            }
        }
    }

    fn insert_new_bodies(&mut self, world: &mut World) {
        let pending =
            world.filter::<Without<(&Transform, &Collider, &RigidBody), &SpatialRef>>();

        for entity in pending {
            let tagged = world.get::<&StaticTag>(entity).is_ok();
            let Ok((transform, collider, rb)) =
                world.query_one_mut::<(&Transform, &Collider, &mut RigidBody)>(entity)
            else {
                continue;
            };
            if tagged {
                rigid_body::enforce_static(entity, rb);
            }

            let aabb = collider.shape.compute_aabb(transform);
            let spatial =
                self.broadphase
                    .insert(entity, aabb, rb.is_immovable(), collider.layer);
            if let Err(err) = world.insert_one(entity, spatial) {
                tracing::error!(?entity, %err, "failed to attach grid membership");
            }
        }
    }

    fn update_moved_bodies(&mut self, world: &mut World) {
        let moved = world.filter::<Without<(&Transform, &Collider, &SpatialRef), &StaticTag>>();

        for entity in moved {
            let Ok((transform, collider, spatial)) =
                world.query_one_mut::<(&Transform, &Collider, &mut SpatialRef)>(entity)
            else {
                continue;
            };
            let aabb = collider.shape.compute_aabb(transform);
            self.broadphase.update(entity, spatial, aabb, collider.layer);
        }
    }

    fn resolve_pairs(&mut self, world: &mut World, dt: f32) {
        self.contacts.clear();
        for pair in self.broadphase.pairs() {
            if let Some(manifold) =
                solver::resolve_pair(world, pair.a, pair.b, dt, self.config.correction_factor)
            {
                self.contacts.push(manifold);
            }
        }
    }

    fn reset(&mut self, world: &mut World) {
        self.stats = self.broadphase.stats();
        world.insert_singleton(self.stats);
        tracing::trace!(
            chunks = self.stats.chunks,
            live_entries = self.stats.live_entries,
            unique_pairs = self.stats.unique_pairs,
            contacts = self.contacts.len(),
            "physics tick"
        );
        self.broadphase.clear_pairs();
    }

    /// Despawn an entity, removing it from every grid chunk first.
    pub fn despawn(&mut self, world: &mut World, entity: hecs::Entity) -> Result<(), PhysicsError> {
        if let Ok(spatial) = world.remove_one::<SpatialRef>(entity) {
            self.broadphase.remove(entity, &spatial);
        }
        world.despawn(entity)?;
        Ok(())
    }

    /// Nearest hit along a ray that has no [`Ray`](crate::Ray) component.
    ///
    /// `direction` need not be normalized; a zero direction never hits.
    pub fn raycast(
        &self,
        world: &World,
        source: Vec2,
        direction: Vec2,
        length: f32,
        layer: u32,
    ) -> Option<RayHit> {
        let direction = direction.normalize_or_zero();
        raycast::cast(
            world,
            &self.broadphase,
            &self.matrix,
            source,
            source + direction * length,
            layer,
            None,
        )
    }

    /// Like [`raycast`](Self::raycast) with the direction taken from a
    /// rotation, skipping `exclude`.
    pub fn raycast_from(
        &self,
        world: &World,
        transform: &Transform,
        length: f32,
        layer: u32,
        exclude: Option<hecs::Entity>,
    ) -> Option<RayHit> {
        let source = transform.position;
        let target = source + direction_from_rotation(transform.rotation) * length;
        raycast::cast(
            world,
            &self.broadphase,
            &self.matrix,
            source,
            target,
            layer,
            exclude,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::physics::Ray;
    use std::f32::consts::FRAC_PI_2;

    fn physics() -> PhysicsWorld {
        PhysicsWorld::new(PhysicsConfig::default(), CollisionMatrix::default()).unwrap()
    }

    fn spawn_circle(world: &mut World, position: Vec2, radius: f32, rb: RigidBody) -> hecs::Entity {
        world.spawn((Transform::from_position(position), Collider::circle(radius), rb))
    }

    #[test]
    fn test_physics_config_default() {
        let config = PhysicsConfig::default();
        assert_eq!(config.cell_size, 50.0);
        assert_eq!(config.correction_factor, 0.5);
        assert!((config.fixed_timestep - 1.0 / 60.0).abs() < 1e-10);
        assert_eq!(config.max_substeps, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_physics_config_rejects_bad_values() {
        let bad_cell = PhysicsConfig {
            cell_size: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            PhysicsWorld::new(bad_cell, CollisionMatrix::default()),
            Err(PhysicsError::InvalidCellSize(_))
        ));

        let bad_factor = PhysicsConfig {
            correction_factor: 1.5,
            ..Default::default()
        };
        assert_eq!(
            bad_factor.validate(),
            Err(PhysicsError::InvalidCorrectionFactor(1.5))
        );

        let bad_step = PhysicsConfig {
            fixed_timestep: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            bad_step.validate(),
            Err(PhysicsError::InvalidTimestep(_))
        ));
    }

    #[test]
    fn test_pipeline_order() {
        assert_eq!(
            PIPELINE,
            [
                Stage::Insert,
                Stage::Integrate,
                Stage::Update,
                Stage::Pairs,
                Stage::Resolve,
                Stage::Rays,
                Stage::Reset,
            ]
        );
    }

    #[test]
    fn test_tick_moves_bodies() {
        let mut world = World::new();
        let mut physics = physics();
        let e = spawn_circle(
            &mut world,
            Vec2::ZERO,
            1.0,
            RigidBody::new_dynamic(1.0).with_velocity(Vec2::new(60.0, 0.0)),
        );

        physics.tick(&mut world, 1.0 / 60.0);

        let eps = 1e-4;
        let pos = world.get::<&Transform>(e).unwrap().position;
        assert!((pos - Vec2::new(1.0, 0.0)).length() < eps);
        assert!(world.get::<&SpatialRef>(e).is_ok());
    }

    #[test]
    fn test_overlapping_circles_are_pushed_apart() {
        let mut world = World::new();
        let mut physics = physics();
        let a = spawn_circle(&mut world, Vec2::ZERO, 5.0, RigidBody::new_dynamic(1.0));
        let b = spawn_circle(&mut world, Vec2::new(8.0, 0.0), 5.0, RigidBody::new_dynamic(1.0));

        physics.tick(&mut world, 1.0 / 60.0);

        assert_eq!(physics.contacts().len(), 1);
        let contact = physics.contacts()[0];
        let eps = 1e-5;
        assert!((contact.info.penetration - 2.0).abs() < eps);

        let pa = world.get::<&Transform>(a).unwrap().position;
        let pb = world.get::<&Transform>(b).unwrap().position;
        assert!((pb - pa).length() > 8.0);
    }

    #[test]
    fn test_static_tag_body_never_moves() {
        let mut world = World::new();
        let mut physics = physics();
        let wall = world.spawn((
            Transform::from_position(Vec2::ZERO),
            Collider::rect(Vec2::new(10.0, 10.0)),
            // Finite mass gets normalised away
            RigidBody::new_dynamic(3.0),
            StaticTag,
        ));
        let ball = spawn_circle(
            &mut world,
            Vec2::new(13.0, 0.0),
            5.0,
            RigidBody::new_dynamic(1.0).with_velocity(Vec2::new(-30.0, 0.0)),
        );

        for _ in 0..10 {
            physics.tick(&mut world, 1.0 / 60.0);
        }

        assert_eq!(world.get::<&Transform>(wall).unwrap().position, Vec2::ZERO);
        assert!(world.get::<&RigidBody>(wall).unwrap().is_immovable());
        let ball_x = world.get::<&Transform>(ball).unwrap().position.x;
        assert!(ball_x > 10.0, "ball pushed into the wall: x = {ball_x}");
    }

    #[test]
    fn test_layer_change_applies_next_tick() {
        let mut world = World::new();
        let matrix = CollisionMatrix::from_table(
            &["Default", "Ghost"],
            &[vec![true], vec![false, false]],
        )
        .unwrap();
        let ghost = matrix.layer("Ghost");
        let mut physics = PhysicsWorld::new(PhysicsConfig::default(), matrix).unwrap();

        let a = spawn_circle(&mut world, Vec2::new(10.0, 10.0), 2.0, RigidBody::new_dynamic(1.0));
        let b = spawn_circle(&mut world, Vec2::new(30.0, 10.0), 2.0, RigidBody::new_dynamic(1.0));
        physics.tick(&mut world, 1.0 / 60.0);
        assert!(physics.contacts().is_empty());

        world.get::<&mut Collider>(a).unwrap().layer = ghost;
        world.get::<&mut Transform>(b).unwrap().position = Vec2::new(12.0, 10.0);
        physics.tick(&mut world, 1.0 / 60.0);

        assert!(physics.contacts().is_empty());
        assert_eq!(physics.stats().unique_pairs, 0);
        assert_eq!(world.get::<&SpatialRef>(a).unwrap().layer(), ghost);
    }

    #[test]
    fn test_static_static_never_resolved() {
        let mut world = World::new();
        let mut physics = physics();
        for x in [0.0, 3.0] {
            world.spawn((
                Transform::from_position(Vec2::new(x, 0.0)),
                Collider::circle(5.0),
                RigidBody::new_static(),
                StaticTag,
            ));
        }

        physics.tick(&mut world, 1.0 / 60.0);

        assert!(physics.contacts().is_empty());
        assert_eq!(physics.stats().unique_pairs, 0);
    }

    #[test]
    fn test_ray_component_hits_circle() {
        let mut world = World::new();
        let mut physics = physics();
        let shooter = world.spawn((
            Transform::from_position_rotation(Vec2::ZERO, -FRAC_PI_2),
            Collider::circle(1.0),
            RigidBody::new_static(),
            StaticTag,
            Ray::new(100.0),
        ));
        spawn_circle(&mut world, Vec2::new(20.0, 0.0), 5.0, RigidBody::new_static());

        physics.tick(&mut world, 1.0 / 60.0);

        let ray = *world.get::<&Ray>(shooter).unwrap();
        assert!(ray.hit);
        let eps = 1e-3;
        assert!((ray.hit_point - Vec2::new(15.0, 0.0)).length() < eps);

        // A free-standing query from just outside the shooter agrees
        let hit = physics
            .raycast(&world, Vec2::new(2.0, 0.0), Vec2::X, 100.0, 1)
            .unwrap();
        assert!((hit.point - Vec2::new(15.0, 0.0)).length() < eps);
    }

    #[test]
    fn test_ray_miss_resets_hit() {
        let mut world = World::new();
        let mut physics = physics();
        let shooter = world.spawn((
            Transform::from_position_rotation(Vec2::ZERO, -FRAC_PI_2),
            Collider::circle(1.0),
            RigidBody::new_dynamic(1.0),
            Ray::new(100.0),
        ));
        let target = spawn_circle(&mut world, Vec2::new(20.0, 0.0), 5.0, RigidBody::new_static());

        physics.tick(&mut world, 1.0 / 60.0);
        assert!(world.get::<&Ray>(shooter).unwrap().hit);

        physics.despawn(&mut world, target).unwrap();
        physics.tick(&mut world, 1.0 / 60.0);
        assert!(!world.get::<&Ray>(shooter).unwrap().hit);
    }

    #[test]
    fn test_despawn_removes_chunk_entries() {
        let mut world = World::new();
        let mut physics = physics();
        let e = spawn_circle(&mut world, Vec2::ZERO, 5.0, RigidBody::new_dynamic(1.0));

        physics.tick(&mut world, 1.0 / 60.0);
        assert_eq!(physics.stats().live_entries, 4);

        physics.despawn(&mut world, e).unwrap();
        physics.tick(&mut world, 1.0 / 60.0);

        let stats = physics.stats();
        assert_eq!(stats.live_entries, 0);
        assert_eq!(stats.chunks, 4);
        assert!(!world.contains(e));

        assert_eq!(
            physics.despawn(&mut world, e),
            Err(PhysicsError::NoSuchEntity(hecs::NoSuchEntity))
        );
    }

    #[test]
    fn test_stats_published_as_singleton() {
        let mut world = World::new();
        let mut physics = physics();
        spawn_circle(&mut world, Vec2::new(10.0, 10.0), 2.0, RigidBody::new_dynamic(1.0));
        spawn_circle(&mut world, Vec2::new(12.0, 10.0), 2.0, RigidBody::new_dynamic(1.0));

        physics.tick(&mut world, 1.0 / 60.0);

        let published = *world.singleton::<BroadphaseStats>().unwrap();
        assert_eq!(published, physics.stats());
        assert_eq!(published.chunks, 1);
        assert_eq!(published.live_entries, 2);
        assert_eq!(published.unique_pairs, 1);
        // Global pairs are cleared at the end of the tick
        assert!(physics.broadphase().pairs().is_empty());
    }

    #[test]
    fn test_step_accumulates_fixed_ticks() {
        let mut world = World::new();
        let mut physics = physics();
        let e = spawn_circle(
            &mut world,
            Vec2::new(10.0, 10.0),
            1.0,
            RigidBody::new_dynamic(1.0).with_velocity(Vec2::new(6.0, 0.0)),
        );

        // Two and a half timesteps: two ticks run, half a step carries over
        physics.step(&mut world, 2.5 / 60.0);

        let eps = 1e-4;
        let pos = world.get::<&Transform>(e).unwrap().position;
        assert!((pos.x - 10.2).abs() < eps);
    }

    #[test]
    fn test_simulation_is_deterministic() {
        fn run() -> Vec<Vec2> {
            let mut world = World::new();
            let mut physics = physics();
            let mut entities = Vec::new();
            for i in 0..12 {
                let angle = i as f32 * 0.5;
                let position = Vec2::new(angle.cos(), angle.sin()) * 40.0;
                let rb = RigidBody::new_dynamic(1.0 + i as f32 * 0.1).with_velocity(-position);
                let collider = if i % 2 == 0 {
                    Collider::circle(4.0)
                } else {
                    Collider::rect(Vec2::new(3.0, 5.0))
                };
                entities.push(world.spawn((
                    Transform::from_position_rotation(position, angle),
                    collider,
                    rb,
                )));
            }
            for _ in 0..120 {
                physics.tick(&mut world, 1.0 / 60.0);
            }
            entities
                .iter()
                .map(|e| world.get::<&Transform>(*e).unwrap().position)
                .collect()
        }

        let first = run();
        let second = run();
        assert_eq!(first, second);
        assert!(first.iter().all(|p| p.is_finite()));
    }
}
