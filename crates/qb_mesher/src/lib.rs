//! Greedy surface meshing for Qubicle (`.qb`) voxel models.
//!
//! This crate decodes `.qb` streams into colored voxel volumes, merges the
//! exposed faces of each volume into large quads, and lays their UVs out in a
//! single power-of-two texture atlas.
//!
//! # Example
//!
//! ```
//! use glam::{IVec3, UVec3};
//! use qb_mesher::{mesh_volume, MeshOptions, Volume, Voxel, VoxelGrid};
//!
//! let mut grid = VoxelGrid::new(UVec3::new(2, 2, 2));
//! for (x, y, z) in [(0, 0, 0), (1, 0, 0), (0, 1, 0), (1, 1, 0)] {
//!     grid.set(x, y, z, Some(Voxel::new(200, 40, 40)));
//! }
//!
//! let mesh = mesh_volume(&Volume::new("wall", IVec3::ZERO, grid), &MeshOptions::default()).unwrap();
//! assert_eq!(mesh.quad_count(), 6); // A 2x2x1 slab merges to one quad per side
//! assert_eq!(mesh.triangle_indices().len(), 36);
//! ```

pub mod core;
pub mod error;
pub mod decode;
pub mod convert;
pub mod cull;
pub mod merge;
pub mod expand;
pub mod mesh;
pub mod atlas;
pub mod assemble;

// Re-export primary types
pub use crate::core::{
    Voxel,
    VoxelGrid,
    Volume,
    Direction,
    Quad,
    UvIsland,
    SurfaceMesh,
    MeshOutput,
    MeshOptions,
    MaterialId,
    // Direction table
    DIRECTIONS,
    DIR_TOP, DIR_BOTTOM, DIR_RIGHT, DIR_LEFT, DIR_FRONT, DIR_BACK,
};
pub use crate::error::{DecodeError, MeshError};
pub use crate::decode::{ColorFormat, QbHeader, QbReader};
pub use crate::atlas::{AtlasPacker, PackedRect, Rect};

// Re-export main entry points
pub use crate::assemble::{mesh_qb, mesh_volume, mesh_volume_with_stats, VolumeMesh};
pub use crate::mesh::{generate_surface, generate_surface_with_stats, MeshStats};
pub use crate::convert::{merge_volumes, volume_from_colors};
