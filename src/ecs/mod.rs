//! Entity Component System integration with hecs.

pub mod components;
pub mod world;

pub use world::World;

pub mod prelude {
    pub use super::components::*;
    pub use super::world::World;
}
