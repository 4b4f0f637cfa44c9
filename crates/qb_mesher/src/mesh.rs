//! Greedy surface meshing of one volume.
//!
//! For each of the six directions, in table order:
//! 1. Exposure slice extraction per depth layer
//! 2. Greedy merge of the slice into quads
//! 3. Quad expansion into vertex arrays, plus one UV island per non-empty layer

use crate::core::{SurfaceMesh, UvIsland, Volume, DIRECTIONS};
use crate::cull::{extract_slice, ExposureSlice};
use crate::expand::emit_quads;
use crate::merge::greedy_merge;

/// Statistics about a mesh result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshStats {
    /// Total number of quads generated
    pub quad_count: usize,
    /// Quads per direction, in [`DIRECTIONS`] order
    pub quads_per_direction: [usize; 6],
    /// Faces that passed the exposure test (quads without merging)
    pub exposed_faces: usize,
    /// Total vertices
    pub vertex_count: usize,
    /// UV islands (non-empty slices)
    pub island_count: usize,
    /// Final atlas side length, 0 when no atlas was built
    pub atlas_size: u32,
    /// 1.0 = everything merged into nothing, 0.0 = no merging
    pub merge_efficiency: f32,
}

impl MeshStats {
    pub(crate) fn finish_merge_efficiency(&mut self) {
        self.merge_efficiency = if self.exposed_faces > 0 {
            1.0 - (self.quad_count as f32 / self.exposed_faces as f32)
        } else {
            0.0
        };
    }
}

/// Mesh a volume into quads with slice-local UVs.
///
/// # Example
/// ```
/// use glam::{IVec3, UVec3};
/// use qb_mesher::{generate_surface, Volume, Voxel, VoxelGrid};
///
/// let mut grid = VoxelGrid::new(UVec3::splat(3));
/// grid.set(1, 1, 1, Some(Voxel::new(255, 255, 255)));
///
/// let mesh = generate_surface(&Volume::new("v", IVec3::ZERO, grid));
/// assert_eq!(mesh.quad_count(), 6);
/// ```
pub fn generate_surface(volume: &Volume) -> SurfaceMesh {
    generate_surface_with_stats(volume).0
}

/// Mesh a volume and return statistics along with the mesh.
pub fn generate_surface_with_stats(volume: &Volume) -> (SurfaceMesh, MeshStats) {
    let mut mesh = SurfaceMesh::default();
    let mut stats = MeshStats::default();

    if volume.grid.is_empty() {
        return (mesh, stats);
    }

    let size = volume.size();
    let mut quads = Vec::new();

    for (face, dir) in DIRECTIONS.iter().enumerate() {
        let slice_width = dir.slice_width(size);
        let slice_height = dir.slice_height(size);
        let mut slice = ExposureSlice::new(slice_width, slice_height);

        for depth in 0..dir.stack_size(size) {
            let exposed = extract_slice(volume, dir, depth, &mut slice);
            if exposed == 0 {
                continue;
            }
            stats.exposed_faces += exposed;

            quads.clear();
            greedy_merge(&mut slice, &mut quads);
            stats.quads_per_direction[face] += quads.len();

            let start_index = mesh.vertices.len();
            emit_quads(dir, depth, &quads, &mut mesh);
            let vertex_count = mesh.vertices.len() - start_index;

            if vertex_count > 0 {
                mesh.islands.push(UvIsland {
                    start_index,
                    vertex_count,
                    width: slice_width,
                    height: slice_height,
                });
            }
        }
    }

    stats.quad_count = mesh.quad_count();
    stats.vertex_count = mesh.vertex_count();
    stats.island_count = mesh.islands.len();
    stats.finish_merge_efficiency();

    log::trace!(
        "meshed '{}': {} quads from {} exposed faces, {} islands",
        volume.name,
        stats.quad_count,
        stats.exposed_faces,
        stats.island_count
    );

    (mesh, stats)
}
