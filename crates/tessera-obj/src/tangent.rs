//! Tangent-space derivation.
//!
//! Area-weighted per-triangle tangent/bitangent accumulation followed by
//! Gram–Schmidt reorthogonalization against the vertex normal. Bitangents
//! are not stored; consumers reconstruct them as `cross(N, T) * tangent.w`.

use glam::Vec3;

use crate::types::Mesh;

/// Accumulated tangents and bitangents below this magnitude are treated as
/// degenerate.
const MIN_TANGENT_LENGTH: f32 = 1e-10;

pub(crate) fn calc_tangent_space(meshes: &mut [Mesh]) {
    for mesh in meshes {
        let mut bitangents = vec![Vec3::ZERO; mesh.vertices.len()];

        for triangle in mesh.indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            let v0 = mesh.vertices[i0];
            let v1 = mesh.vertices[i1];
            let v2 = mesh.vertices[i2];

            let e1 = v1.position - v0.position;
            let e2 = v2.position - v0.position;
            let d1 = v1.tex_coords - v0.tex_coords;
            let d2 = v2.tex_coords - v0.tex_coords;

            let f = 1.0 / (d1.x * d2.y - d2.x * d1.y);
            let tangent = f * (e1 * d2.y - e2 * d1.y);
            let bitangent = f * (e2 * d1.x - e1 * d2.x);

            // Degenerate UV mapping or geometry contributes nothing.
            if !tangent.is_finite()
                || !bitangent.is_finite()
                || tangent.length() < MIN_TANGENT_LENGTH
                || bitangent.length() < MIN_TANGENT_LENGTH
            {
                continue;
            }

            let area = 0.5 * e1.cross(e2).length();
            for &index in &[i0, i1, i2] {
                let accumulated = mesh.vertices[index].tangent.truncate() + tangent * area;
                mesh.vertices[index].tangent = accumulated.extend(0.0);
                bitangents[index] += bitangent * area;
            }
        }

        for (vertex, bitangent) in mesh.vertices.iter_mut().zip(&bitangents) {
            let accumulated = vertex.tangent.truncate();
            let tangent = if accumulated.length() > MIN_TANGENT_LENGTH {
                let ortho = accumulated - vertex.normal * vertex.normal.dot(accumulated);
                ortho.try_normalize().unwrap_or(Vec3::X)
            } else {
                Vec3::X
            };

            // Handedness from the unnormalized bitangent; zero maps to +1.
            let handedness = if vertex.normal.cross(tangent).dot(*bitangent) < 0.0 {
                -1.0
            } else {
                1.0
            };
            vertex.tangent = tangent.extend(handedness);
        }
    }
}
