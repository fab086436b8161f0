//! Transform component for ECS entities.

use glam::{Mat2, Vec2};

/// World-space placement of a body: position plus rotation in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    pub rotation: f32,
}

impl Transform {
    /// Create an identity transform.
    pub fn identity() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
        }
    }

    /// Create a transform from a position.
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            rotation: 0.0,
        }
    }

    pub fn from_position_rotation(position: Vec2, rotation: f32) -> Self {
        Self { position, rotation }
    }

    /// Rotation matrix taking local-space vectors to world space.
    #[inline]
    pub fn rotation_matrix(&self) -> Mat2 {
        Mat2::from_angle(self.rotation)
    }

    /// Map a local-space point to world space.
    #[inline]
    pub fn to_world(&self, local: Vec2) -> Vec2 {
        self.rotation_matrix() * local + self.position
    }

    /// Map a world-space point into this transform's local frame.
    #[inline]
    pub fn to_local(&self, world: Vec2) -> Vec2 {
        self.rotation_matrix().transpose() * (world - self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
