//! Greedy rectangle merging over one exposure slice.
//!
//! Scans rows (y outer, x inner). Each unconsumed cell starts a quad that
//! grows right while the color matches, then down while the whole
//! current-width row matches. Consumed cells are emptied so every exposed
//! face lands in exactly one quad.

use crate::core::Quad;
use crate::cull::ExposureSlice;

/// Merge the exposed faces of `slice` into quads, appending to `output`.
///
/// `slice` is left empty.
pub fn greedy_merge(slice: &mut ExposureSlice, output: &mut Vec<Quad>) {
    let width = slice.width();
    let height = slice.height();

    for y in 0..height {
        let mut x = 0;
        while x < width {
            let Some(color) = slice.get(x, y) else {
                x += 1;
                continue;
            };

            // Extend width in +x
            let mut w = 1;
            while x + w < width && slice.get(x + w, y) == Some(color) {
                w += 1;
            }

            // Extend height in +y, only by whole rows
            let mut h = 1;
            'height: while y + h < height {
                for k in 0..w {
                    if slice.get(x + k, y + h) != Some(color) {
                        break 'height;
                    }
                }
                h += 1;
            }

            for qy in y..y + h {
                for qx in x..x + w {
                    let taken = slice.take(qx, qy);
                    debug_assert_eq!(taken, Some(color), "quad covered a foreign cell");
                }
            }

            output.push(Quad { x, y, width: w, height: h, color });
            x += w;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Voxel;

    const A: Voxel = Voxel::new(255, 0, 0);
    const B: Voxel = Voxel::new(0, 255, 0);

    /// Build a slice from rows of `'a'`, `'b'` and `'.'` (empty).
    fn slice_from(rows: &[&str]) -> ExposureSlice {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let mut slice = ExposureSlice::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                let v = match c {
                    'a' => Some(A),
                    'b' => Some(B),
                    _ => None,
                };
                slice.set(x as u32, y as u32, v);
            }
        }
        slice
    }

    fn merge(rows: &[&str]) -> Vec<Quad> {
        let mut slice = slice_from(rows);
        let mut quads = Vec::new();
        greedy_merge(&mut slice, &mut quads);
        assert!(slice.is_empty(), "merge must consume every exposed cell");
        quads
    }

    #[test]
    fn uniform_slab_is_one_quad() {
        let quads = merge(&["aaaa", "aaaa", "aaaa"]);
        assert_eq!(quads, vec![Quad { x: 0, y: 0, width: 4, height: 3, color: A }]);
    }

    #[test]
    fn empty_slice_no_quads() {
        assert!(merge(&["...", "..."]).is_empty());
    }

    #[test]
    fn colors_do_not_merge() {
        let quads = merge(&["ab"]);
        assert_eq!(quads.len(), 2);
        assert_eq!(quads[0].color, A);
        assert_eq!(quads[1], Quad { x: 1, y: 0, width: 1, height: 1, color: B });
    }

    #[test]
    fn partial_row_stops_height_growth() {
        // Second row breaks at x=2, so the first quad stays one row tall.
        let quads = merge(&["aaa", "aa.", "aa."]);
        assert_eq!(quads[0], Quad { x: 0, y: 0, width: 3, height: 1, color: A });
        assert_eq!(quads[1], Quad { x: 0, y: 1, width: 2, height: 2, color: A });
        assert_eq!(quads.len(), 2);
    }

    #[test]
    fn scan_resumes_after_quad() {
        let quads = merge(&["aa.b"]);
        assert_eq!(quads.len(), 2);
        assert_eq!(quads[0].width, 2);
        assert_eq!((quads[1].x, quads[1].color), (3, B));
    }

    #[test]
    fn area_matches_exposed_count() {
        let rows = ["abba.", "aab.a", "bbbba", ".a.aa"];
        let exposed = slice_from(&rows).exposed_count() as u32;
        let area: u32 = merge(&rows).iter().map(Quad::area).sum();
        assert_eq!(area, exposed);
    }

    #[test]
    fn consumed_cells_are_skipped() {
        // The tall left quad consumes (0,1); row 1 scanning must not restart there.
        let quads = merge(&["ab", "ab"]);
        assert_eq!(quads.len(), 2);
        assert!(quads.iter().all(|q| q.height == 2 && q.width == 1));
    }
}
