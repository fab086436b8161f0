//! Rigid body integration functions.

use hecs::Without;

use crate::ecs::components::physics::{RigidBody, StaticTag};
use crate::ecs::components::transform::Transform;

/// Integrate positions and rotations: p += v * dt, θ += ω * dt.
///
/// Bodies carrying [`StaticTag`] never move.
pub fn integrate_velocities(world: &mut hecs::World, dt: f32) {
    for (_, (rb, transform)) in
        world.query_mut::<Without<(&RigidBody, &mut Transform), &StaticTag>>()
    {
        transform.position += rb.linear_velocity * dt;
        transform.rotation += rb.angular_velocity * dt;
    }
}

/// Force a tagged body to infinite mass. Returns `true` if it had to change.
pub fn enforce_static(entity: hecs::Entity, rb: &mut RigidBody) -> bool {
    if rb.is_immovable() && rb.inv_inertia() == 0.0 {
        return false;
    }
    tracing::warn!(
        ?entity,
        mass = rb.mass(),
        inertia = rb.inertia(),
        "static body had finite mass; making it immovable"
    );
    rb.make_static();
    true
}
