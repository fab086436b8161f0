//! Contact data structures for collision response.

use glam::Vec2;

/// Narrowphase result for one pair of shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactInfo {
    /// Contact normal (from shape A to shape B), unit length.
    pub normal: Vec2,
    /// Penetration depth.
    pub penetration: f32,
    points: [Vec2; 2],
    count: usize,
}

impl ContactInfo {
    pub fn single(normal: Vec2, penetration: f32, point: Vec2) -> Self {
        Self {
            normal,
            penetration,
            points: [point, Vec2::ZERO],
            count: 1,
        }
    }

    pub(crate) fn from_points(normal: Vec2, penetration: f32, points: [Vec2; 2], count: usize) -> Self {
        Self {
            normal,
            penetration,
            points,
            count: count.min(2),
        }
    }

    /// World-space contact points (one or two).
    #[inline]
    pub fn points(&self) -> &[Vec2] {
        &self.points[..self.count]
    }

    /// Same contact seen from the other shape.
    pub fn flipped(mut self) -> Self {
        self.normal = -self.normal;
        self
    }
}

/// A resolved contact between two entities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactManifold {
    pub entity_a: hecs::Entity,
    pub entity_b: hecs::Entity,
    pub info: ContactInfo,
}
