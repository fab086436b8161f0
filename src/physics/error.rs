//! Recoverable errors raised by physics configuration and the public API.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PhysicsError {
    #[error("cell size must be finite and positive, got {0}")]
    InvalidCellSize(f32),

    #[error("correction factor must lie in [0, 1], got {0}")]
    InvalidCorrectionFactor(f32),

    #[error("fixed timestep must be finite and positive, got {0}")]
    InvalidTimestep(f64),

    #[error("entity does not exist")]
    NoSuchEntity(#[from] hecs::NoSuchEntity),
}

/// Errors produced while building a [`CollisionMatrix`](super::CollisionMatrix).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayerError {
    #[error("at most {max} layers are supported, got {count}")]
    TooManyLayers { count: usize, max: usize },

    #[error("layer `{0}` is declared twice")]
    DuplicateLayer(String),

    #[error("row {row} of the collision table must have {expected} entries, got {actual}")]
    RowLength {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("collision table declares no layers")]
    EmptyTable,
}
