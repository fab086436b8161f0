//! Shared setup helpers for impulse2d benchmarks.
//!
//! ## Running
//!
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench physics
//!
//! Filter by group:
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench physics -- broadphase

use anyhow::Context;
use glam::Vec2;
use impulse2d::physics::broadphase::Broadphase;
use impulse2d::physics::CollisionMatrix;
use impulse2d::{
    Collider, PhysicsConfig, PhysicsWorld, Ray, RigidBody, StaticTag, Transform, World,
};

// ---------------------------------------------------------------------------
// Basic scenes
// ---------------------------------------------------------------------------

/// Spawn `n` dynamic circles in a grid layout so neighbours overlap.
pub fn setup_circle_world(n: usize) -> World {
    let mut world = World::new();
    let cols = (n as f32).sqrt().ceil() as usize;

    for i in 0..n {
        let pos = Vec2::new((i % cols) as f32 * 7.5, (i / cols) as f32 * 7.5);
        world.spawn((
            Transform::from_position(pos),
            RigidBody::new_dynamic(1.0),
            Collider::circle(5.0),
        ));
    }
    world
}

/// Mixed scene: half dynamic circles, half static rectangles.
#[allow(clippy::manual_is_multiple_of)]
pub fn setup_mixed_world(n: usize) -> World {
    let mut world = World::new();
    let cols = (n as f32).sqrt().ceil() as usize;

    for i in 0..n {
        let pos = Vec2::new((i % cols) as f32 * 7.5, (i / cols) as f32 * 7.5);
        if i % 2 == 0 {
            world.spawn((
                Transform::from_position(pos),
                RigidBody::new_dynamic(1.0),
                Collider::circle(5.0),
            ));
        } else {
            world.spawn((
                Transform::from_position_rotation(pos, i as f32 * 0.3),
                RigidBody::new_static(),
                Collider::rect(Vec2::new(4.0, 2.5)),
                StaticTag,
            ));
        }
    }
    world
}

/// Sparse scene: bodies spread far apart (no overlaps).
pub fn setup_sparse_world(n: usize) -> World {
    let mut world = World::new();
    let cols = (n as f32).sqrt().ceil() as usize;

    for i in 0..n {
        let pos = Vec2::new((i % cols) as f32 * 60.0, (i / cols) as f32 * 60.0);
        world.spawn((
            Transform::from_position(pos),
            RigidBody::new_dynamic(1.0),
            Collider::circle(2.5),
        ));
    }
    world
}

/// Register every body of `world` in a fresh broadphase.
pub fn populate_broadphase(world: &World, cell_size: f32) -> Broadphase {
    let mut broadphase = Broadphase::new(cell_size);
    let mut query = world.query::<(&Transform, &Collider, &RigidBody)>();
    for (entity, (transform, collider, rb)) in query.iter() {
        broadphase.insert(
            entity,
            collider.shape.compute_aabb(transform),
            rb.is_immovable(),
            collider.layer,
        );
    }
    broadphase
}

/// Arena walls plus `n` moving bodies inside, some of them casting rays.
#[allow(clippy::manual_is_multiple_of)]
pub fn setup_scene(n: usize) -> anyhow::Result<(World, PhysicsWorld)> {
    let mut world = World::new();
    let physics = PhysicsWorld::new(PhysicsConfig::default(), CollisionMatrix::default())
        .context("default physics config rejected")?;

    let cols = (n as f32).sqrt().ceil() as usize;
    let extent = cols as f32 * 12.0;

    for (pos, half) in [
        (Vec2::new(0.0, -extent - 10.0), Vec2::new(extent + 20.0, 10.0)),
        (Vec2::new(0.0, extent + 10.0), Vec2::new(extent + 20.0, 10.0)),
        (Vec2::new(-extent - 10.0, 0.0), Vec2::new(10.0, extent + 20.0)),
        (Vec2::new(extent + 10.0, 0.0), Vec2::new(10.0, extent + 20.0)),
    ] {
        world.spawn((
            Transform::from_position(pos),
            RigidBody::new_static(),
            Collider::rect(half),
            StaticTag,
        ));
    }

    for i in 0..n {
        let x = (i % cols) as f32 * 24.0 - extent + 12.0;
        let y = (i / cols) as f32 * 24.0 - extent + 12.0;
        let angle = i as f32 * 0.7;
        let velocity = Vec2::new(angle.cos(), angle.sin()) * 40.0;
        let transform = Transform::from_position_rotation(Vec2::new(x, y), angle);

        let entity = if i % 2 == 0 {
            world.spawn((
                transform,
                RigidBody::new_dynamic(1.0).with_velocity(velocity),
                Collider::circle(4.0),
            ))
        } else {
            world.spawn((
                transform,
                RigidBody::new_dynamic(2.0).with_velocity(velocity),
                Collider::rect(Vec2::new(5.0, 3.0)),
            ))
        };

        if i % 10 == 0 {
            world
                .insert_one(entity, Ray::new(150.0))
                .context("freshly spawned entity vanished")?;
        }
    }

    Ok((world, physics))
}

// ---------------------------------------------------------------------------
// Spawner churn (continuous spawn + despawn + tick)
// ---------------------------------------------------------------------------

/// Run `frames` ticks, spawning `spawn_per_frame` bodies and despawning the
/// oldest ones once more than `cap` exist.
pub fn run_churn(
    world: &mut World,
    physics: &mut PhysicsWorld,
    frames: usize,
    spawn_per_frame: usize,
    cap: usize,
) -> anyhow::Result<()> {
    let mut alive = std::collections::VecDeque::new();
    for frame in 0..frames {
        for k in 0..spawn_per_frame {
            let angle = (frame * spawn_per_frame + k) as f32 * 0.37;
            let direction = Vec2::new(angle.cos(), angle.sin());
            let mut rb = RigidBody::new_dynamic(1.0);
            rb.apply_force(direction * 60.0);
            alive.push_back(world.spawn((
                Transform::from_position(direction * 5.0),
                rb,
                Collider::circle(2.0),
            )));
        }
        while alive.len() > cap {
            if let Some(oldest) = alive.pop_front() {
                physics
                    .despawn(world, oldest)
                    .context("despawning a tracked body")?;
            }
        }
        physics.tick(world, 1.0 / 60.0);
    }
    Ok(())
}
