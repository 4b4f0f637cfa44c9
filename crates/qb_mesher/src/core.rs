//! Core type definitions for the Qubicle mesher.

use glam::{IVec3, UVec2, UVec3, Vec2, Vec3};

use crate::error::MeshError;

/// Material identifier. Decoded voxels always carry material 0; merged
/// volumes tag each voxel with the index of the volume it came from.
pub type MaterialId = u32;

/// Direction indices into [`DIRECTIONS`].
pub const DIR_TOP: usize = 0;
pub const DIR_BOTTOM: usize = 1;
pub const DIR_RIGHT: usize = 2;
pub const DIR_LEFT: usize = 3;
pub const DIR_FRONT: usize = 4;
pub const DIR_BACK: usize = 5;

/// A single colored voxel.
///
/// Empty cells are `None` in a [`VoxelGrid`]; there is no "empty" voxel value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Voxel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub material: MaterialId,
}

impl Voxel {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, material: 0 }
    }

    pub const fn with_material(self, material: MaterialId) -> Self {
        Self { material, ..self }
    }

    /// Normalized RGBA color, alpha is always 1.
    pub fn rgba(&self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            1.0,
        ]
    }
}

/// Dense 3D voxel storage indexed `[x, y, z]`, x varying fastest.
///
/// Dimensions are fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelGrid {
    size: UVec3,
    cells: Vec<Option<Voxel>>,
}

impl VoxelGrid {
    /// Number of cells for a grid of `size`, or `None` on overflow.
    pub fn cell_count(size: UVec3) -> Option<usize> {
        (size.x as usize)
            .checked_mul(size.y as usize)?
            .checked_mul(size.z as usize)
    }

    /// Create an empty grid.
    ///
    /// # Panics
    /// Panics if the grid cannot be allocated; use [`VoxelGrid::try_new`] for
    /// untrusted sizes.
    pub fn new(size: UVec3) -> Self {
        Self::try_new(size).expect("voxel grid too large to allocate")
    }

    /// Create an empty grid, or `None` if its cells cannot be allocated.
    pub fn try_new(size: UVec3) -> Option<Self> {
        let count = Self::cell_count(size)?;
        let bytes = count.checked_mul(std::mem::size_of::<Option<Voxel>>())?;
        if bytes > isize::MAX as usize {
            return None;
        }

        let mut cells = Vec::new();
        cells.try_reserve_exact(count).ok()?;
        cells.resize(count, None);
        Some(Self { size, cells })
    }

    #[inline]
    pub fn size(&self) -> UVec3 {
        self.size
    }

    #[inline]
    fn index(&self, x: u32, y: u32, z: u32) -> usize {
        debug_assert!(
            x < self.size.x && y < self.size.y && z < self.size.z,
            "Coordinates out of bounds"
        );
        let sx = self.size.x as usize;
        let sy = self.size.y as usize;
        x as usize + y as usize * sx + z as usize * sx * sy
    }

    /// Voxel at a cell known to be in bounds.
    #[inline]
    pub fn get(&self, x: u32, y: u32, z: u32) -> Option<Voxel> {
        self.cells[self.index(x, y, z)]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, z: u32, voxel: Option<Voxel>) {
        let idx = self.index(x, y, z);
        self.cells[idx] = voxel;
    }

    /// Whether a signed coordinate lies inside the grid.
    #[inline]
    pub fn contains(&self, p: IVec3) -> bool {
        p.x >= 0
            && p.y >= 0
            && p.z >= 0
            && (p.x as u32) < self.size.x
            && (p.y as u32) < self.size.y
            && (p.z as u32) < self.size.z
    }

    /// Voxel at a signed coordinate; out-of-bounds reads as empty.
    #[inline]
    pub fn get_signed(&self, p: IVec3) -> Option<Voxel> {
        if self.contains(p) {
            self.get(p.x as u32, p.y as u32, p.z as u32)
        } else {
            None
        }
    }

    /// Count of occupied cells.
    pub fn solid_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.is_none())
    }

    /// Iterate occupied cells as `(x, y, z, voxel)`.
    pub fn iter_solid(&self) -> impl Iterator<Item = (u32, u32, u32, Voxel)> + '_ {
        let sx = self.size.x as usize;
        let sy = self.size.y as usize;
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            cell.map(|v| {
                let x = i % sx;
                let y = (i / sx) % sy;
                let z = i / (sx * sy);
                (x as u32, y as u32, z as u32, v)
            })
        })
    }
}

/// A named, positioned voxel grid (a Qubicle "matrix").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Volume {
    pub name: String,
    pub position: IVec3,
    pub grid: VoxelGrid,
}

impl Volume {
    pub fn new(name: impl Into<String>, position: IVec3, grid: VoxelGrid) -> Self {
        Self {
            name: name.into(),
            position,
            grid,
        }
    }

    /// Extent of the volume; always equal to the grid dimensions.
    #[inline]
    pub fn size(&self) -> UVec3 {
        self.grid.size()
    }
}

/// Axis-aligned facing used to sweep one family of slices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Direction {
    /// Outward face normal.
    pub normal: IVec3,
    /// Slice-space +y axis.
    pub up: IVec3,
    /// Slice-space +x axis.
    pub right: IVec3,
    /// Emit quad corners as `[0, 1, 2, 3]` when set, `[0, 3, 2, 1]` otherwise.
    pub clockwise: bool,
}

impl Direction {
    /// Length of `size` projected onto `axis` (sign ignored).
    #[inline]
    pub fn extent(axis: IVec3, size: UVec3) -> u32 {
        axis.x.unsigned_abs() * size.x + axis.y.unsigned_abs() * size.y + axis.z.unsigned_abs() * size.z
    }

    /// Number of depth layers along the normal.
    #[inline]
    pub fn stack_size(&self, size: UVec3) -> u32 {
        Self::extent(self.normal, size)
    }

    #[inline]
    pub fn slice_width(&self, size: UVec3) -> u32 {
        Self::extent(self.right, size)
    }

    #[inline]
    pub fn slice_height(&self, size: UVec3) -> u32 {
        Self::extent(self.up, size)
    }

    /// Grid cell for slice cell `(sx, sy)` at depth `d`.
    #[inline]
    pub fn to_grid(&self, sx: u32, sy: u32, d: u32) -> IVec3 {
        self.right * sx as i32 + self.up * sy as i32 + self.normal.abs() * d as i32
    }
}

/// The six sweep directions. The order fixes the layout of every output array.
pub const DIRECTIONS: [Direction; 6] = [
    // top
    Direction {
        normal: IVec3::new(0, 1, 0),
        up: IVec3::new(0, 0, 1),
        right: IVec3::new(1, 0, 0),
        clockwise: true,
    },
    // bottom
    Direction {
        normal: IVec3::new(0, -1, 0),
        up: IVec3::new(0, 0, 1),
        right: IVec3::new(1, 0, 0),
        clockwise: false,
    },
    // right
    Direction {
        normal: IVec3::new(1, 0, 0),
        up: IVec3::new(0, 1, 0),
        right: IVec3::new(0, 0, 1),
        clockwise: true,
    },
    // left
    Direction {
        normal: IVec3::new(-1, 0, 0),
        up: IVec3::new(0, 1, 0),
        right: IVec3::new(0, 0, 1),
        clockwise: false,
    },
    // front
    Direction {
        normal: IVec3::new(0, 0, 1),
        up: IVec3::new(0, 1, 0),
        right: IVec3::new(1, 0, 0),
        clockwise: false,
    },
    // back
    Direction {
        normal: IVec3::new(0, 0, -1),
        up: IVec3::new(0, 1, 0),
        right: IVec3::new(1, 0, 0),
        clockwise: true,
    },
];

/// Maximal same-colored rectangle of exposed faces within one slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quad {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub color: Voxel,
}

impl Quad {
    #[inline]
    pub fn area(&self) -> u32 {
        self.width * self.height
    }
}

/// Contiguous vertex range produced by one slice, packed as one atlas rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UvIsland {
    pub start_index: usize,
    pub vertex_count: usize,
    pub width: u32,
    pub height: u32,
}

impl UvIsland {
    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start_index..self.start_index + self.vertex_count
    }
}

/// Mesher output before atlas packing.
///
/// UVs are slice-local grid units.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SurfaceMesh {
    /// Vertex positions, 4 per quad.
    pub vertices: Vec<Vec3>,
    /// Quad indices, 4 per quad.
    pub indices: Vec<u32>,
    /// One UV per vertex.
    pub uvs: Vec<UVec2>,
    /// One voxel per quad.
    pub face_colors: Vec<Voxel>,
    /// One island per non-empty slice, in generation order.
    pub islands: Vec<UvIsland>,
}

impl SurfaceMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn quad_count(&self) -> usize {
        self.face_colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.face_colors.is_empty()
    }
}

/// Final mesh handed to exporters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshOutput {
    /// Vertex positions, 4 per quad.
    pub vertices: Vec<Vec3>,
    /// Quad indices, 4 per quad.
    pub indices: Vec<u32>,
    /// Atlas UVs in `[0, 1]`, one per vertex. Empty when UVs were not requested.
    pub uvs: Vec<Vec2>,
    /// One voxel per quad.
    pub face_colors: Vec<Voxel>,
    /// Side length of the square atlas the UVs were packed into (0 without UVs).
    pub atlas_size: u32,
}

impl MeshOutput {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn quad_count(&self) -> usize {
        self.face_colors.len()
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.face_colors.is_empty()
    }

    /// Vertex positions as a flat `[x, y, z, ...]` slice.
    pub fn positions_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// UVs as a flat `[u, v, ...]` slice.
    pub fn uvs_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.uvs)
    }

    /// Split every quad into two triangles, keeping its winding.
    pub fn triangle_indices(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.indices.len() / 4 * 6);
        for q in self.indices.chunks_exact(4) {
            out.extend_from_slice(&[q[0], q[1], q[2], q[0], q[2], q[3]]);
        }
        out
    }

    /// Per-vertex RGBA colors, the quad color repeated on its 4 corners.
    pub fn vertex_colors(&self) -> Vec<[f32; 4]> {
        self.face_colors
            .iter()
            .flat_map(|v| std::iter::repeat(v.rgba()).take(4))
            .collect()
    }

    /// Per-quad material ids.
    pub fn material_ids(&self) -> Vec<MaterialId> {
        self.face_colors.iter().map(|v| v.material).collect()
    }
}

/// Options controlling mesh assembly.
#[derive(Debug, Clone)]
pub struct MeshOptions {
    /// Pack islands into an atlas and emit normalized UVs.
    pub generate_uvs: bool,
    /// Gap added to both dimensions of every island before packing.
    pub padding: u32,
    /// Largest atlas side allowed; `None` grows without bound.
    pub max_atlas_size: Option<u32>,
    /// Merge every volume of a stream into one before meshing.
    pub merge_volumes: bool,
    /// Name given to the merged volume.
    pub merged_name: String,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            generate_uvs: true,
            padding: 1,
            max_atlas_size: None,
            merge_volumes: false,
            merged_name: "merged".to_string(),
        }
    }
}

impl MeshOptions {
    pub fn validate(&self) -> Result<(), MeshError> {
        if let Some(limit) = self.max_atlas_size {
            if limit < 2 || !limit.is_power_of_two() {
                return Err(MeshError::InvalidOptions(format!(
                    "max_atlas_size must be a power of two >= 2 (got {limit})"
                )));
            }
        }
        Ok(())
    }
}
