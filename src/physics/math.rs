//! Scalar tolerance and 2D cross-product helpers shared by the physics stages.

use glam::Vec2;

/// Tolerance for degenerate-geometry checks (`f32::EPSILON`).
pub const EPSILON: f32 = 1.192_092_9e-7;

/// True when `a` and `b` differ by at most [`EPSILON`].
#[inline]
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() <= EPSILON
}

/// Scalar cross product `a.x * b.y - a.y * b.x`.
#[inline]
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.perp_dot(b)
}

/// Cross of a scalar angular velocity with a vector: `(-s * v.y, s * v.x)`.
#[inline]
pub fn cross_sv(s: f32, v: Vec2) -> Vec2 {
    Vec2::new(-s * v.y, s * v.x)
}
