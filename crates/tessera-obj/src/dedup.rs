//! Tolerance-aware vertex merging.
//!
//! Collapses vertices whose quantized keys match, walking the index list in
//! order so triangle orientation is preserved and the remap is stable.

use ahash::AHashMap;

use crate::types::{Mesh, VertexKey};

pub(crate) fn join_identical_vertices(meshes: &mut [Mesh]) {
    for mesh in meshes {
        if mesh.vertices.is_empty() {
            continue;
        }

        let mut seen: AHashMap<VertexKey, u32> = AHashMap::with_capacity(mesh.vertices.len());
        let mut vertices = Vec::with_capacity(mesh.vertices.len());
        let mut indices = Vec::with_capacity(mesh.indices.len());

        for &index in &mesh.indices {
            let vertex = mesh.vertices[index as usize];
            let mapped = *seen.entry(vertex.quantized_key()).or_insert_with(|| {
                // First occurrence keeps the original, unquantized vertex.
                vertices.push(vertex);
                (vertices.len() - 1) as u32
            });
            indices.push(mapped);
        }

        mesh.vertices = vertices;
        mesh.indices = indices;
    }
}
