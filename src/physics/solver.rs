//! Impulse resolver with angular terms and positional correction.

use glam::Vec2;

use crate::ecs::components::physics::{Collider, RigidBody};
use crate::ecs::components::transform::Transform;

use super::contact::{ContactInfo, ContactManifold};
use super::math::{approx_eq, cross, cross_sv};
use super::narrowphase::detect_collision;

/// Snapshot of the state the resolver reads and writes for one body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: Vec2,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub inv_mass: f32,
    pub inv_inertia: f32,
}

impl BodyState {
    pub fn new(transform: &Transform, rb: &RigidBody) -> Self {
        Self {
            position: transform.position,
            linear_velocity: rb.linear_velocity,
            angular_velocity: rb.angular_velocity,
            inv_mass: rb.inv_mass(),
            inv_inertia: rb.inv_inertia(),
        }
    }

    /// Point velocity including the rotational term.
    #[inline]
    fn velocity_at(&self, arm: Vec2) -> Vec2 {
        self.linear_velocity + cross_sv(self.angular_velocity, arm)
    }
}

/// Apply the contact's impulses and positional correction to both bodies.
///
/// Impulses are split evenly across the contact points and scaled by `dt`.
/// Returns `false` without touching either body when both are immovable.
pub fn resolve_contact(
    info: &ContactInfo,
    a: &mut BodyState,
    b: &mut BodyState,
    dt: f32,
    correction_factor: f32,
) -> bool {
    let inv_mass_sum = a.inv_mass + b.inv_mass;
    if approx_eq(inv_mass_sum, 0.0) {
        return false;
    }

    let normal = info.normal;
    let count = info.points().len() as f32;

    for &point in info.points() {
        let r_a = point - a.position;
        let r_b = point - b.position;

        let relative_velocity = b.velocity_at(r_b) - a.velocity_at(r_a);

        let r_a_cross_n = cross(r_a, normal);
        let r_b_cross_n = cross(r_b, normal);
        let effective = inv_mass_sum
            + r_a_cross_n * r_a_cross_n * a.inv_inertia
            + r_b_cross_n * r_b_cross_n * b.inv_inertia;

        let magnitude = -relative_velocity.dot(normal) / effective / count;
        let impulse = normal * magnitude * dt;

        a.linear_velocity -= impulse * a.inv_mass;
        a.angular_velocity += a.inv_inertia * cross(r_a, -impulse);
        b.linear_velocity += impulse * b.inv_mass;
        b.angular_velocity += b.inv_inertia * cross(r_b, impulse);
    }

    let correction = normal * (info.penetration / inv_mass_sum * correction_factor);
    a.position -= correction * a.inv_mass;
    b.position += correction * b.inv_mass;
    true
}

/// Detect and resolve one broadphase pair against the live component data.
///
/// Returns the manifold when the shapes were touching. Entities missing a
/// required component are skipped.
pub fn resolve_pair(
    world: &mut hecs::World,
    entity_a: hecs::Entity,
    entity_b: hecs::Entity,
    dt: f32,
    correction_factor: f32,
) -> Option<ContactManifold> {
    let (mut state_a, mut state_b, info) = {
        let (transform_a, collider_a, rb_a) = read_body(world, entity_a)?;
        let (transform_b, collider_b, rb_b) = read_body(world, entity_b)?;

        let info = detect_collision(&collider_a.shape, &transform_a, &collider_b.shape, &transform_b)?;
        (
            BodyState::new(&transform_a, &rb_a),
            BodyState::new(&transform_b, &rb_b),
            info,
        )
    };

    if resolve_contact(&info, &mut state_a, &mut state_b, dt, correction_factor) {
        write_body(world, entity_a, &state_a);
        write_body(world, entity_b, &state_b);
    }

    Some(ContactManifold {
        entity_a,
        entity_b,
        info,
    })
}

fn read_body(world: &hecs::World, entity: hecs::Entity) -> Option<(Transform, Collider, RigidBody)> {
    let transform = *world.get::<&Transform>(entity).ok()?;
    let collider = *world.get::<&Collider>(entity).ok()?;
    let rb = *world.get::<&RigidBody>(entity).ok()?;
    Some((transform, collider, rb))
}

fn write_body(world: &mut hecs::World, entity: hecs::Entity, state: &BodyState) {
    if let Ok(mut rb) = world.get::<&mut RigidBody>(entity) {
        rb.linear_velocity = state.linear_velocity;
        rb.angular_velocity = state.angular_velocity;
    }
    if let Ok(mut transform) = world.get::<&mut Transform>(entity) {
        transform.position = state.position;
    }
}
