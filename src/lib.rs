//! impulse2d
//!
//! A deterministic 2D rigid-body engine built on hecs.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **ecs** - Component store (hecs world plus typed singletons) and components
//! 2. **physics** - Uniform-grid broadphase, narrowphase, impulse resolver, ray queries
//!
//! A simulation is driven by [`PhysicsWorld::tick`] (variable timestep) or
//! [`PhysicsWorld::step`] (fixed timestep accumulator) against an [`ecs::World`].

pub mod ecs;
pub mod physics;

pub use ecs::prelude::*;

pub use physics::{
    CollisionMatrix, LayerError, PhysicsConfig, PhysicsError, PhysicsWorld, RayHit,
};

// Re-export glam and hecs for convenience
pub use glam;
pub use hecs;
