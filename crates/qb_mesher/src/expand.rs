//! Quad expansion to vertex arrays.
//!
//! Each quad becomes 4 corner vertices on the true face plane, 4 slice-local
//! UVs equal to its rectangle, one index group of 4 and one face color.

use glam::{UVec2, Vec3};

use crate::core::{Direction, Quad, SurfaceMesh};

/// Corner order shared by vertices and UVs.
#[inline]
fn quad_corners(q: &Quad) -> [(u32, u32); 4] {
    [
        (q.x, q.y),
        (q.x, q.y + q.height),
        (q.x + q.width, q.y + q.height),
        (q.x + q.width, q.y),
    ]
}

/// Position of slice point `(x, y)` on the face plane of layer `depth`.
///
/// The layer center sits at `depth + 0.5` along the normal axis; half a unit
/// along the signed normal moves it onto the face.
#[inline]
pub fn face_vertex(dir: &Direction, depth: u32, x: u32, y: u32) -> Vec3 {
    dir.right.as_vec3() * x as f32
        + dir.up.as_vec3() * y as f32
        + dir.normal.abs().as_vec3() * (depth as f32 + 0.5)
        + dir.normal.as_vec3() * 0.5
}

/// Index order for one quad, relative to its first vertex.
#[inline]
pub fn winding(dir: &Direction) -> [u32; 4] {
    if dir.clockwise {
        [0, 1, 2, 3]
    } else {
        [0, 3, 2, 1]
    }
}

/// Append one quad to `mesh`.
pub fn emit_quad(dir: &Direction, depth: u32, quad: &Quad, mesh: &mut SurfaceMesh) {
    let base = mesh.vertices.len() as u32;

    for i in winding(dir) {
        mesh.indices.push(base + i);
    }
    for (x, y) in quad_corners(quad) {
        mesh.vertices.push(face_vertex(dir, depth, x, y));
        mesh.uvs.push(UVec2::new(x, y));
    }
    mesh.face_colors.push(quad.color);
}

/// Append every quad of one slice.
pub fn emit_quads(dir: &Direction, depth: u32, quads: &[Quad], mesh: &mut SurfaceMesh) {
    mesh.vertices.reserve(quads.len() * 4);
    mesh.uvs.reserve(quads.len() * 4);
    mesh.indices.reserve(quads.len() * 4);
    mesh.face_colors.reserve(quads.len());

    for quad in quads {
        emit_quad(dir, depth, quad, mesh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Voxel, DIRECTIONS, DIR_BACK, DIR_BOTTOM, DIR_LEFT, DIR_TOP};

    fn unit_quad() -> Quad {
        Quad { x: 0, y: 0, width: 1, height: 1, color: Voxel::new(1, 2, 3) }
    }

    #[test]
    fn single_quad_counts() {
        let mut mesh = SurfaceMesh::default();
        emit_quad(&DIRECTIONS[DIR_TOP], 0, &unit_quad(), &mut mesh);

        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.uvs.len(), 4);
        assert_eq!(mesh.indices.len(), 4);
        assert_eq!(mesh.face_colors, vec![Voxel::new(1, 2, 3)]);
    }

    #[test]
    fn top_face_sits_on_upper_plane() {
        let mut mesh = SurfaceMesh::default();
        emit_quad(&DIRECTIONS[DIR_TOP], 2, &unit_quad(), &mut mesh);

        // Layer 2 spans y in [2, 3]; its top face is y = 3.
        assert!(mesh.vertices.iter().all(|v| v.y == 3.0));
        assert_eq!(mesh.vertices[0], Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(mesh.vertices[2], Vec3::new(1.0, 3.0, 1.0));
    }

    #[test]
    fn bottom_face_sits_on_lower_plane() {
        let mut mesh = SurfaceMesh::default();
        emit_quad(&DIRECTIONS[DIR_BOTTOM], 2, &unit_quad(), &mut mesh);
        assert!(mesh.vertices.iter().all(|v| v.y == 2.0));
    }

    #[test]
    fn left_and_back_faces_on_zero_plane() {
        let mut mesh = SurfaceMesh::default();
        emit_quad(&DIRECTIONS[DIR_LEFT], 0, &unit_quad(), &mut mesh);
        assert!(mesh.vertices.iter().all(|v| v.x == 0.0));

        let mut mesh = SurfaceMesh::default();
        emit_quad(&DIRECTIONS[DIR_BACK], 0, &unit_quad(), &mut mesh);
        assert!(mesh.vertices.iter().all(|v| v.z == 0.0));
    }

    #[test]
    fn winding_follows_direction() {
        let mut mesh = SurfaceMesh::default();
        emit_quad(&DIRECTIONS[DIR_TOP], 0, &unit_quad(), &mut mesh);
        emit_quad(&DIRECTIONS[DIR_BOTTOM], 0, &unit_quad(), &mut mesh);

        assert_eq!(&mesh.indices[..4], &[0, 1, 2, 3]);
        assert_eq!(&mesh.indices[4..], &[4, 7, 6, 5]);
    }

    #[test]
    fn uvs_match_quad_rectangle() {
        let quad = Quad { x: 2, y: 1, width: 3, height: 4, color: Voxel::new(0, 0, 1) };
        let mut mesh = SurfaceMesh::default();
        emit_quads(&DIRECTIONS[DIR_TOP], 0, &[quad], &mut mesh);

        assert_eq!(
            mesh.uvs,
            vec![UVec2::new(2, 1), UVec2::new(2, 5), UVec2::new(5, 5), UVec2::new(5, 1)]
        );
    }
}
