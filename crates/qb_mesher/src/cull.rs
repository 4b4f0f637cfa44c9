//! Exposure-slice extraction.
//!
//! For one direction and depth layer, builds the 2D map of voxel faces that
//! point into empty space. A face is exposed if the voxel exists AND its
//! neighbor one step along the normal is outside the grid or empty.

use crate::core::{Direction, Volume, Voxel};

/// 2D working buffer of exposed faces, indexed `[x + y * width]`.
///
/// Reused across layers; the merge pass empties every cell it consumes.
#[derive(Clone, Debug)]
pub struct ExposureSlice {
    width: u32,
    height: u32,
    cells: Vec<Option<Voxel>>,
}

impl ExposureSlice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<Voxel> {
        self.cells[x as usize + y as usize * self.width as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, voxel: Option<Voxel>) {
        self.cells[x as usize + y as usize * self.width as usize] = voxel;
    }

    /// Take the voxel out of a cell, leaving it empty.
    #[inline]
    pub fn take(&mut self, x: u32, y: u32) -> Option<Voxel> {
        self.cells[x as usize + y as usize * self.width as usize].take()
    }

    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// Number of non-empty cells.
    pub fn exposed_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.is_none())
    }
}

/// Fill `slice` with the exposed faces of `volume` at depth `depth` along `dir`.
///
/// Returns the number of exposed cells. `slice` must be sized
/// `dir.slice_width(size) x dir.slice_height(size)`.
pub fn extract_slice(volume: &Volume, dir: &Direction, depth: u32, slice: &mut ExposureSlice) -> usize {
    debug_assert_eq!(slice.width(), dir.slice_width(volume.size()));
    debug_assert_eq!(slice.height(), dir.slice_height(volume.size()));

    slice.clear();
    let grid = &volume.grid;
    let mut exposed = 0;

    for sy in 0..slice.height() {
        for sx in 0..slice.width() {
            let p = dir.to_grid(sx, sy, depth);
            let Some(voxel) = grid.get_signed(p) else {
                continue;
            };
            if grid.get_signed(p + dir.normal).is_none() {
                slice.set(sx, sy, Some(voxel));
                exposed += 1;
            }
        }
    }

    exposed
}
