//! Input conversion helpers feeding the mesher.
//!
//! - Merging every volume of a file into one bounding volume
//! - Building a volume from a dense array of packed color words

use glam::{I64Vec3, IVec3, UVec3};

use crate::core::{MaterialId, Volume, VoxelGrid};
use crate::decode::ColorFormat;
use crate::error::MeshError;

/// Merge volumes into a single volume covering all of them.
///
/// Voxels copied from `volumes[i]` are tagged with material `i`. Later
/// volumes overwrite earlier ones where they overlap. Returns `Ok(None)` for
/// an empty slice, and [`MeshError::MergeTooLarge`] when the combined bounds
/// cannot be allocated.
///
/// # Example
/// ```
/// use glam::{IVec3, UVec3};
/// use qb_mesher::{merge_volumes, Volume, Voxel, VoxelGrid};
///
/// let mut a = VoxelGrid::new(UVec3::ONE);
/// a.set(0, 0, 0, Some(Voxel::new(255, 0, 0)));
/// let mut b = VoxelGrid::new(UVec3::ONE);
/// b.set(0, 0, 0, Some(Voxel::new(0, 255, 0)));
///
/// let merged = merge_volumes(
///     &[Volume::new("a", IVec3::ZERO, a), Volume::new("b", IVec3::new(2, 0, 0), b)],
///     "model",
/// )
/// .unwrap()
/// .unwrap();
/// assert_eq!(merged.size(), UVec3::new(3, 1, 1));
/// assert_eq!(merged.grid.get(2, 0, 0).unwrap().material, 1);
/// ```
pub fn merge_volumes(volumes: &[Volume], name: impl Into<String>) -> Result<Option<Volume>, MeshError> {
    let Some(first) = volumes.first() else {
        return Ok(None);
    };

    // Positions are arbitrary i32s; widen so the bounds cannot overflow.
    let lower = |v: &Volume| v.position.as_i64vec3();
    let upper = |v: &Volume| v.position.as_i64vec3() + v.size().as_i64vec3();

    let mut min = lower(first);
    let mut max = upper(first);
    for v in &volumes[1..] {
        min = min.min(lower(v));
        max = max.max(upper(v));
    }

    let span = max - min;
    let too_large = MeshError::MergeTooLarge { x: span.x, y: span.y, z: span.z };
    if span.cmpgt(I64Vec3::splat(u32::MAX as i64)).any() {
        return Err(too_large);
    }
    let size = span.as_uvec3();
    let mut grid = VoxelGrid::try_new(size).ok_or(too_large)?;

    for (i, volume) in volumes.iter().enumerate() {
        let offset = (volume.position.as_i64vec3() - min).as_uvec3();
        let material = i as MaterialId;
        for (x, y, z, voxel) in volume.grid.iter_solid() {
            grid.set(
                x + offset.x,
                y + offset.y,
                z + offset.z,
                Some(voxel.with_material(material)),
            );
        }
    }

    // Every component of `min` is one of the input positions.
    let position = min.as_ivec3();
    log::debug!(
        "merged {} volumes into size={:?} position={:?}",
        volumes.len(),
        size,
        position
    );
    Ok(Some(Volume::new(name, position, grid)))
}

/// Build a volume from packed color words stored x-fastest, then y, then z.
///
/// Missing trailing words are treated as empty; extra words are ignored.
///
/// # Panics
/// Panics if `size` cannot be allocated, like [`VoxelGrid::new`].
///
/// # Example
/// ```
/// use glam::{IVec3, UVec3};
/// use qb_mesher::{volume_from_colors, ColorFormat, Voxel};
///
/// let volume = volume_from_colors("v", IVec3::ZERO, UVec3::new(2, 1, 1), &[0x0000FF, 0], ColorFormat::Rgba);
/// assert_eq!(volume.grid.get(0, 0, 0), Some(Voxel::new(255, 0, 0)));
/// assert_eq!(volume.grid.get(1, 0, 0), None);
/// ```
pub fn volume_from_colors(
    name: impl Into<String>,
    position: IVec3,
    size: UVec3,
    colors: &[u32],
    format: ColorFormat,
) -> Volume {
    let mut grid = VoxelGrid::new(size);
    let mut words = colors.iter();

    'fill: for z in 0..size.z {
        for y in 0..size.y {
            for x in 0..size.x {
                let Some(&word) = words.next() else {
                    break 'fill;
                };
                grid.set(x, y, z, format.unpack(word));
            }
        }
    }

    Volume::new(name, position, grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Voxel;

    fn cube(name: &str, pos: IVec3, size: u32, color: Voxel) -> Volume {
        let mut grid = VoxelGrid::new(UVec3::splat(size));
        for z in 0..size {
            for y in 0..size {
                for x in 0..size {
                    grid.set(x, y, z, Some(color));
                }
            }
        }
        Volume::new(name, pos, grid)
    }

    #[test]
    fn merge_empty_is_none() {
        assert!(merge_volumes(&[], "x").unwrap().is_none());
    }

    #[test]
    fn merge_single_keeps_geometry() {
        let red = Voxel::new(255, 0, 0);
        let merged = merge_volumes(&[cube("a", IVec3::new(-1, 2, 3), 2, red)], "m")
            .unwrap()
            .unwrap();

        assert_eq!(merged.name, "m");
        assert_eq!(merged.position, IVec3::new(-1, 2, 3));
        assert_eq!(merged.size(), UVec3::splat(2));
        assert_eq!(merged.grid.solid_count(), 8);
        assert_eq!(merged.grid.get(1, 1, 1), Some(red));
    }

    #[test]
    fn merge_bounds_and_materials() {
        let red = Voxel::new(255, 0, 0);
        let green = Voxel::new(0, 255, 0);
        let merged = merge_volumes(
            &[
                cube("a", IVec3::new(0, 0, 0), 2, red),
                cube("b", IVec3::new(-3, 1, 0), 1, green),
            ],
            "m",
        )
        .unwrap()
        .unwrap();

        assert_eq!(merged.position, IVec3::new(-3, 0, 0));
        assert_eq!(merged.size(), UVec3::new(5, 2, 2));
        assert_eq!(merged.grid.get(3, 0, 0), Some(red.with_material(0)));
        assert_eq!(merged.grid.get(0, 1, 0), Some(green.with_material(1)));
        assert_eq!(merged.grid.get(1, 0, 0), None);
        assert_eq!(merged.grid.solid_count(), 9);
    }

    #[test]
    fn merge_later_volume_overwrites() {
        let red = Voxel::new(255, 0, 0);
        let blue = Voxel::new(0, 0, 255);
        let merged = merge_volumes(
            &[cube("a", IVec3::ZERO, 2, red), cube("b", IVec3::ONE, 1, blue)],
            "m",
        )
        .unwrap()
        .unwrap();

        assert_eq!(merged.size(), UVec3::splat(2));
        assert_eq!(merged.grid.get(1, 1, 1), Some(blue.with_material(1)));
        assert_eq!(merged.grid.get(0, 0, 0), Some(red));
    }

    #[test]
    fn merge_far_apart_volumes_is_an_error() {
        let v = Voxel::new(1, 2, 3);
        let volumes = [
            cube("lo", IVec3::splat(i32::MIN), 1, v),
            cube("hi", IVec3::splat(i32::MAX - 1), 1, v),
        ];

        let err = merge_volumes(&volumes, "m").unwrap_err();
        let span = u32::MAX as i64;
        assert!(matches!(err, MeshError::MergeTooLarge { x, y, z } if x == span && y == span && z == span));
    }

    #[test]
    fn merge_extreme_positions_that_fit() {
        let v = Voxel::new(1, 2, 3);
        let merged = merge_volumes(
            &[
                cube("a", IVec3::splat(i32::MAX - 1), 1, v),
                cube("b", IVec3::new(i32::MAX - 2, i32::MAX - 1, i32::MAX - 1), 1, v),
            ],
            "m",
        )
        .unwrap()
        .unwrap();

        assert_eq!(merged.position, IVec3::new(i32::MAX - 2, i32::MAX - 1, i32::MAX - 1));
        assert_eq!(merged.size(), UVec3::new(2, 1, 1));
        assert_eq!(merged.grid.solid_count(), 2);
    }

    #[test]
    fn colors_short_input_leaves_empty_cells() {
        let v = volume_from_colors("v", IVec3::ZERO, UVec3::new(2, 2, 1), &[0xFF], ColorFormat::Bgra);
        assert_eq!(v.grid.get(0, 0, 0), Some(Voxel::new(0, 0, 255)));
        assert_eq!(v.grid.solid_count(), 1);
    }
}
