//! Per-LOD mesh concatenation.
//!
//! Produces one draw-call-friendly mesh per LOD, topologically identical to
//! the union of its sources: vertices are appended verbatim and indices are
//! offset by the running base-vertex count.

use std::collections::BTreeMap;

use crate::types::Mesh;

pub(crate) fn combine_meshes(meshes: &BTreeMap<u32, Vec<Mesh>>) -> Vec<Mesh> {
    let mut combined = Vec::with_capacity(meshes.len());

    for lod in meshes.values() {
        let Some(first) = lod.first() else {
            continue;
        };
        let mut target = Mesh {
            name: first.name.clone(),
            material: first.material.clone(),
            lod_level: first.lod_level,
            mesh_number: first.mesh_number,
            ..Default::default()
        };

        let total_vertices: usize = lod.iter().map(|mesh| mesh.vertices.len()).sum();
        let total_indices: usize = lod.iter().map(|mesh| mesh.indices.len()).sum();
        target.vertices.reserve(total_vertices);
        target.indices.reserve(total_indices);

        let mut base_vertex = 0u32;
        for mesh in lod {
            target
                .indices
                .extend(mesh.indices.iter().map(|&index| index + base_vertex));
            target.vertices.extend_from_slice(&mesh.vertices);
            base_vertex += mesh.vertices.len() as u32;
        }

        combined.push(target);
    }

    combined
}
