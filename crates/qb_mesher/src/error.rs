//! Error types.

use thiserror::Error;

/// Failure while decoding a Qubicle stream. Always fatal for the stream.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("stream ended while reading {field}")]
    Truncated { field: &'static str },

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("volume of size {x}x{y}x{z} is too large to allocate")]
    VolumeTooLarge { x: u32, y: u32, z: u32 },

    #[error("compressed slice z={z} writes cell {cursor} past its {capacity} cells")]
    SliceOverflow { z: u32, cursor: usize, capacity: usize },
}

/// Failure anywhere in the decode → mesh → pack pipeline.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("invalid mesh options: {0}")]
    InvalidOptions(String),

    /// Internal logic fault; never caused by well-formed input.
    #[error("geometry invariant violated: {0}")]
    GeometryInvariant(String),

    #[error("merged volume spanning {x}x{y}x{z} is too large to allocate")]
    MergeTooLarge { x: i64, y: i64, z: i64 },

    #[error("UV islands do not fit in the maximum atlas size {limit}")]
    PackingExhausted { limit: u32 },
}
