//! Mesh assembly: surface meshing, UV island layout and atlas packing.
//!
//! 1. Greedy surface mesh with slice-local UVs
//! 2. Each island translated to its own origin and sized by its UV bounds
//! 3. Islands packed into the smallest power-of-two atlas that holds them,
//!    restarting at double size whenever one does not fit
//! 4. UVs offset into atlas space and normalized to `[0, 1]`

use std::io::Read;

use glam::{IVec3, UVec2, Vec2};

use crate::atlas::AtlasPacker;
use crate::convert::merge_volumes;
use crate::core::{MeshOptions, MeshOutput, SurfaceMesh, UvIsland, Volume};
use crate::decode::QbReader;
use crate::error::MeshError;
use crate::mesh::{generate_surface_with_stats, MeshStats};

/// Smallest atlas side ever tried.
pub const MIN_ATLAS_SIZE: u32 = 2;

/// Meshed volume with the placement data exporters need.
#[derive(Debug, Clone)]
pub struct VolumeMesh {
    pub name: String,
    pub position: IVec3,
    pub mesh: MeshOutput,
    pub stats: MeshStats,
}

/// Move every island's UVs so its bounding box starts at `(0, 0)` and record
/// the box size as the island's packing size.
pub fn normalize_islands(uvs: &mut [UVec2], islands: &mut [UvIsland]) {
    for island in islands.iter_mut() {
        let range = island.range();
        let Some((min, max)) = uvs[range.clone()]
            .iter()
            .fold(None, |acc: Option<(UVec2, UVec2)>, &uv| match acc {
                None => Some((uv, uv)),
                Some((lo, hi)) => Some((lo.min(uv), hi.max(uv))),
            })
        else {
            island.width = 0;
            island.height = 0;
            continue;
        };

        for uv in &mut uvs[range] {
            *uv -= min;
        }
        let extent = max - min;
        island.width = extent.x;
        island.height = extent.y;
    }
}

/// Total padded area the islands need.
pub fn required_area(islands: &[UvIsland], padding: u32) -> u64 {
    islands
        .iter()
        .map(|i| (i.width + padding) as u64 * (i.height + padding) as u64)
        .sum()
}

/// Smallest power-of-two side (at least [`MIN_ATLAS_SIZE`]) whose square holds `area`.
pub fn initial_atlas_size(area: u64) -> u32 {
    let mut size = MIN_ATLAS_SIZE;
    while (size as u64) * (size as u64) < area {
        size *= 2;
    }
    size
}

/// Pack islands in order, doubling the atlas from scratch on the first miss.
///
/// Returns the atlas holding island indices as payloads.
pub fn pack_islands(islands: &[UvIsland], options: &MeshOptions) -> Result<AtlasPacker<usize>, MeshError> {
    let padding = options.padding;
    let mut size = initial_atlas_size(required_area(islands, padding));

    'grow: loop {
        if let Some(limit) = options.max_atlas_size {
            if size > limit {
                return Err(MeshError::PackingExhausted { limit });
            }
        }

        let mut atlas = AtlasPacker::new(size);
        for (index, island) in islands.iter().enumerate() {
            if atlas.insert(island.width + padding, island.height + padding, index).is_err() {
                log::debug!("island {index} did not fit in {size}x{size} atlas, growing");
                size = size.checked_mul(2).ok_or(MeshError::PackingExhausted { limit: size })?;
                continue 'grow;
            }
        }

        log::trace!("packed {} islands into {size}x{size} atlas", islands.len());
        return Ok(atlas);
    }
}

/// Offset island UVs by their atlas placement and normalize by the atlas side.
pub fn apply_atlas(
    uvs: &[UVec2],
    islands: &[UvIsland],
    atlas: &AtlasPacker<usize>,
) -> Result<Vec<Vec2>, MeshError> {
    let mut placed = uvs.to_vec();
    let mut seen = vec![false; islands.len()];

    for packed in atlas.iter() {
        let index = *packed.payload;
        let island = islands.get(index).ok_or_else(|| {
            MeshError::GeometryInvariant(format!("atlas holds unknown island {index}"))
        })?;
        if std::mem::replace(&mut seen[index], true) {
            return Err(MeshError::GeometryInvariant(format!("island {index} packed twice")));
        }
        let offset = UVec2::new(packed.x, packed.y);
        for uv in &mut placed[island.range()] {
            *uv += offset;
        }
    }

    if let Some(missing) = seen.iter().position(|s| !s) {
        return Err(MeshError::GeometryInvariant(format!("island {missing} was never packed")));
    }

    let scale = atlas.size() as f32;
    Ok(placed.iter().map(|uv| uv.as_vec2() / scale).collect())
}

/// Turn a surface mesh into the final output, packing UVs when requested.
pub fn assemble(mut surface: SurfaceMesh, options: &MeshOptions) -> Result<MeshOutput, MeshError> {
    let (uvs, atlas_size) = if options.generate_uvs {
        normalize_islands(&mut surface.uvs, &mut surface.islands);
        let atlas = pack_islands(&surface.islands, options)?;
        let uvs = apply_atlas(&surface.uvs, &surface.islands, &atlas)?;
        (uvs, atlas.size())
    } else {
        (Vec::new(), 0)
    };

    Ok(MeshOutput {
        vertices: surface.vertices,
        indices: surface.indices,
        uvs,
        face_colors: surface.face_colors,
        atlas_size,
    })
}

/// Mesh one volume into its final output.
///
/// # Example
/// ```
/// use glam::{IVec3, UVec3};
/// use qb_mesher::{mesh_volume, MeshOptions, Volume, Voxel, VoxelGrid};
///
/// let mut grid = VoxelGrid::new(UVec3::ONE);
/// grid.set(0, 0, 0, Some(Voxel::new(255, 0, 0)));
///
/// let mesh = mesh_volume(&Volume::new("v", IVec3::ZERO, grid), &MeshOptions::default()).unwrap();
/// assert_eq!(mesh.quad_count(), 6);
/// assert!(mesh.uvs.iter().all(|uv| (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y)));
/// ```
pub fn mesh_volume(volume: &Volume, options: &MeshOptions) -> Result<MeshOutput, MeshError> {
    mesh_volume_with_stats(volume, options).map(|(mesh, _)| mesh)
}

/// Mesh one volume and return statistics along with the output.
pub fn mesh_volume_with_stats(
    volume: &Volume,
    options: &MeshOptions,
) -> Result<(MeshOutput, MeshStats), MeshError> {
    options.validate()?;
    let (surface, mut stats) = generate_surface_with_stats(volume);
    let mesh = assemble(surface, options)?;
    stats.atlas_size = mesh.atlas_size;
    Ok((mesh, stats))
}

/// Decode a `.qb` stream and mesh every volume in it (or their merge).
pub fn mesh_qb<R: Read>(reader: R, options: &MeshOptions) -> Result<Vec<VolumeMesh>, MeshError> {
    options.validate()?;

    let volumes = QbReader::new(reader)?.collect::<Result<Vec<_>, _>>()?;
    let volumes = if options.merge_volumes {
        merge_volumes(&volumes, options.merged_name.as_str())?.into_iter().collect()
    } else {
        volumes
    };

    volumes
        .iter()
        .map(|volume| {
            let (mesh, stats) = mesh_volume_with_stats(volume, options)?;
            log::debug!(
                "'{}': {} quads, {} vertices, atlas {}",
                volume.name,
                stats.quad_count,
                stats.vertex_count,
                stats.atlas_size
            );
            Ok(VolumeMesh {
                name: volume.name.clone(),
                position: volume.position,
                mesh,
                stats,
            })
        })
        .collect()
}
