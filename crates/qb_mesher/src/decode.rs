//! Qubicle binary (`.qb`) decoding.
//!
//! A stream is a 24-byte header followed by `num_matrices` volumes. Each
//! volume carries a length-prefixed name, its size and position, and voxel
//! data that is either raw or run-length compressed per z-slice.
//!
//! [`QbReader`] yields one [`Volume`] per call and consumes the underlying
//! reader as it goes; it cannot be rewound.

use std::io::{ErrorKind, Read};
use std::iter::FusedIterator;

use glam::{IVec3, UVec3};

use crate::core::{Volume, Voxel, VoxelGrid};
use crate::error::DecodeError;

/// Compressed-slice control word: the next two words are `count`, `color`.
pub const CODE_FLAG: u32 = 2;
/// Compressed-slice control word: end of the current z-slice.
pub const NEXT_SLICE_FLAG: u32 = 6;

/// Channel order of packed color words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFormat {
    /// Lowest byte is red.
    Rgba,
    /// Lowest byte is blue.
    Bgra,
}

impl From<u32> for ColorFormat {
    fn from(value: u32) -> Self {
        if value == 0 {
            ColorFormat::Rgba
        } else {
            ColorFormat::Bgra
        }
    }
}

impl ColorFormat {
    /// Decode a packed color word. Zero is an empty cell.
    #[inline]
    pub fn unpack(self, word: u32) -> Option<Voxel> {
        if word == 0 {
            return None;
        }
        let lo = (word & 0xFF) as u8;
        let mid = ((word >> 8) & 0xFF) as u8;
        let hi = ((word >> 16) & 0xFF) as u8;
        Some(match self {
            ColorFormat::Rgba => Voxel::new(lo, mid, hi),
            ColorFormat::Bgra => Voxel::new(hi, mid, lo),
        })
    }
}

/// File header. Only `color_format`, `compressed` and `num_matrices` drive decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QbHeader {
    pub version: u32,
    pub color_format: u32,
    pub z_axis_orientation: u32,
    pub compressed: u32,
    pub visibility_mask_encoded: u32,
    pub num_matrices: u32,
}

impl QbHeader {
    pub fn read<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        Ok(Self {
            version: read_u32(reader, "header.version")?,
            color_format: read_u32(reader, "header.color_format")?,
            z_axis_orientation: read_u32(reader, "header.z_axis_orientation")?,
            compressed: read_u32(reader, "header.compressed")?,
            visibility_mask_encoded: read_u32(reader, "header.visibility_mask_encoded")?,
            num_matrices: read_u32(reader, "header.num_matrices")?,
        })
    }

    pub fn color_format(&self) -> ColorFormat {
        ColorFormat::from(self.color_format)
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed != 0
    }
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], field: &'static str) -> Result<(), DecodeError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => DecodeError::Truncated { field },
        _ => DecodeError::Io(e),
    })
}

fn read_u32<R: Read>(reader: &mut R, field: &'static str) -> Result<u32, DecodeError> {
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf, field)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_i32<R: Read>(reader: &mut R, field: &'static str) -> Result<i32, DecodeError> {
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf, field)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_name<R: Read>(reader: &mut R) -> Result<String, DecodeError> {
    let mut len = [0u8; 1];
    read_exact(reader, &mut len, "volume.name_length")?;
    let mut name = vec![0u8; len[0] as usize];
    read_exact(reader, &mut name, "volume.name")?;
    let text = String::from_utf8_lossy(&name);
    Ok(text.trim_end_matches('\0').to_string())
}

/// Single-pass reader yielding the volumes of a `.qb` stream.
///
/// Iteration stops after the last volume or after the first error.
pub struct QbReader<R> {
    reader: R,
    header: QbHeader,
    remaining: u32,
    failed: bool,
}

impl<R: Read> QbReader<R> {
    /// Read the header and prepare to decode volumes.
    pub fn new(mut reader: R) -> Result<Self, DecodeError> {
        let header = QbHeader::read(&mut reader)?;
        log::debug!(
            "qb header: version={:#x} color_format={:?} compressed={} matrices={}",
            header.version,
            header.color_format(),
            header.is_compressed(),
            header.num_matrices
        );
        Ok(Self {
            reader,
            header,
            remaining: header.num_matrices,
            failed: false,
        })
    }

    pub fn header(&self) -> &QbHeader {
        &self.header
    }

    /// Volumes not yet read.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    fn read_volume(&mut self) -> Result<Volume, DecodeError> {
        let name = read_name(&mut self.reader)?;
        let size = UVec3::new(
            read_u32(&mut self.reader, "volume.size.x")?,
            read_u32(&mut self.reader, "volume.size.y")?,
            read_u32(&mut self.reader, "volume.size.z")?,
        );
        let position = IVec3::new(
            read_i32(&mut self.reader, "volume.position.x")?,
            read_i32(&mut self.reader, "volume.position.y")?,
            read_i32(&mut self.reader, "volume.position.z")?,
        );

        let mut grid = VoxelGrid::try_new(size).ok_or(DecodeError::VolumeTooLarge {
            x: size.x,
            y: size.y,
            z: size.z,
        })?;
        let format = self.header.color_format();

        if self.header.is_compressed() {
            read_compressed(&mut self.reader, &mut grid, format)?;
        } else {
            read_uncompressed(&mut self.reader, &mut grid, format)?;
        }

        log::debug!(
            "decoded volume '{}' size={:?} position={:?} solid={}",
            name,
            size,
            position,
            grid.solid_count()
        );
        Ok(Volume::new(name, position, grid))
    }
}

impl<R: Read> Iterator for QbReader<R> {
    type Item = Result<Volume, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let result = self.read_volume();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            (0, Some(self.remaining as usize))
        }
    }
}

impl<R: Read> FusedIterator for QbReader<R> {}

/// Raw voxel data: one color word per cell, x fastest, then y, then z.
fn read_uncompressed<R: Read>(
    reader: &mut R,
    grid: &mut VoxelGrid,
    format: ColorFormat,
) -> Result<(), DecodeError> {
    let size = grid.size();
    for z in 0..size.z {
        for y in 0..size.y {
            for x in 0..size.x {
                let word = read_u32(reader, "voxel.color")?;
                grid.set(x, y, z, format.unpack(word));
            }
        }
    }
    Ok(())
}

/// Run-length voxel data, one control stream per z-slice.
fn read_compressed<R: Read>(
    reader: &mut R,
    grid: &mut VoxelGrid,
    format: ColorFormat,
) -> Result<(), DecodeError> {
    let size = grid.size();
    let width = size.x as usize;
    let capacity = width * size.y as usize;

    for z in 0..size.z {
        let mut cursor = 0usize;
        loop {
            let word = read_u32(reader, "slice.control")?;
            let (count, color) = match word {
                NEXT_SLICE_FLAG => break,
                CODE_FLAG => {
                    let count = read_u32(reader, "slice.run_count")? as usize;
                    let color = read_u32(reader, "slice.run_color")?;
                    (count, color)
                }
                literal => (1, literal),
            };

            let end = cursor.saturating_add(count);
            if end > capacity {
                return Err(DecodeError::SliceOverflow { z, cursor: end - 1, capacity });
            }

            let voxel = format.unpack(color);
            for i in cursor..end {
                // Unsigned division keeps the row exact for any width.
                let x = (i % width) as u32;
                let y = (i / width) as u32;
                grid.set(x, y, z, voxel);
            }
            cursor = end;
        }
    }
    Ok(())
}
