//! Bounding boxes for collider shapes.

use glam::Vec2;

use crate::ecs::components::physics::ColliderShape;
use crate::ecs::components::transform::Transform;

/// Axis-aligned bounding box for broadphase collision detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Box spanning two arbitrary corner points.
    pub fn from_points(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Test whether two AABBs overlap. Touching edges count as overlap.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

impl ColliderShape {
    /// Compute the world-space AABB for this shape.
    pub fn compute_aabb(&self, transform: &Transform) -> Aabb {
        let center = transform.position;
        let extent = match self {
            ColliderShape::Circle { radius } => Vec2::splat(*radius),
            ColliderShape::Rect(rect) => {
                let half = rect.half_extents();
                let (sin, cos) = transform.rotation.sin_cos();
                let (w, h) = (half.x, half.y);
                Vec2::new(
                    (w * cos + h * sin).abs().max((w * cos - h * sin).abs()),
                    (w * sin - h * cos).abs().max((w * sin + h * cos).abs()),
                )
            }
        };
        Aabb {
            min: center - extent,
            max: center + extent,
        }
    }
}
