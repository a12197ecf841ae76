//! Mesh assembly from parser scratch.
//!
//! Expands face-index triples into flat vertex lists with sequential
//! indices. The output is deliberately triangle soup; deduplication forms
//! the real topology for callers that ask for it.

use glam::{Vec2, Vec3};

use crate::types::{Mesh, TempMesh, Vertex};

/// Populate each mesh with one vertex per face-index triple, in order.
/// Out-of-range attribute slots (absent `vt`/`vn` in the source file)
/// resolve to zeroed attributes; tangents start at zero.
pub(crate) fn construct_vertices(meshes: &mut [Mesh], temps: &[TempMesh]) {
    for (mesh, temp) in meshes.iter_mut().zip(temps) {
        mesh.vertices.reserve(temp.face_indices.len());
        mesh.indices.reserve(temp.face_indices.len());

        for (position_in_soup, triple) in temp.face_indices.iter().enumerate() {
            let position = temp
                .positions
                .get(triple[0] as usize)
                .copied()
                .unwrap_or(Vec3::ZERO);
            let tex_coords = temp
                .tex_coords
                .get(triple[1] as usize)
                .copied()
                .unwrap_or(Vec2::ZERO);
            let normal = temp
                .normals
                .get(triple[2] as usize)
                .copied()
                .unwrap_or(Vec3::ZERO);

            mesh.vertices.push(Vertex::new(position, normal, tex_coords));
            mesh.indices.push(position_in_soup as u32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soup_expansion() {
        let temp = TempMesh {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            tex_coords: vec![Vec2::ZERO, Vec2::X, Vec2::Y],
            normals: vec![Vec3::Z],
            face_indices: vec![[0, 0, 0], [1, 1, 0], [2, 2, 0]],
        };
        let mut meshes = vec![Mesh::default()];

        construct_vertices(&mut meshes, &[temp]);

        let mesh = &meshes[0];
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.vertices[1].position, Vec3::X);
        assert_eq!(mesh.vertices[1].tex_coords, Vec2::X);
        assert_eq!(mesh.vertices[2].normal, Vec3::Z);
    }

    #[test]
    fn test_out_of_range_slots_zero_attributes() {
        let temp = TempMesh {
            positions: vec![Vec3::X],
            tex_coords: Vec::new(),
            normals: Vec::new(),
            face_indices: vec![[0, u32::MAX, u32::MAX]],
        };
        let mut meshes = vec![Mesh::default()];

        construct_vertices(&mut meshes, &[temp]);

        let vertex = meshes[0].vertices[0];
        assert_eq!(vertex.position, Vec3::X);
        assert_eq!(vertex.normal, Vec3::ZERO);
        assert_eq!(vertex.tex_coords, Vec2::ZERO);
    }
}
