//! Mesh, material and loader-state types.

use std::collections::BTreeMap;
use std::path::PathBuf;

use bitflags::bitflags;
use glam::{Vec2, Vec3, Vec4};

/// Scale applied before rounding when quantizing vertex components.
const QUANTIZE_SCALE: f32 = 1e5;

/// Componentwise tolerance for approximate vertex equality.
const EQ_TOLERANCE: f32 = 1e-6;

bitflags! {
    /// Pipeline stage selection for [`crate::ObjLoader::load_file`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LoadFlags: u8 {
        /// Derive per-vertex tangents and handedness.
        const CALCULATE_TANGENTS = 1 << 0;
        /// Merge vertices identical within tolerance.
        const JOIN_IDENTICAL = 1 << 1;
        /// Concatenate each LOD into a single mesh.
        const COMBINE_MESHES = 1 << 2;
        /// Discover `<stem>_lod<k>` sibling files.
        const LODS = 1 << 3;
    }
}

/// A single mesh vertex. The tangent w component carries the ±1 bitangent
/// handedness.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
    pub tangent: Vec4,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, tex_coords: Vec2) -> Self {
        Self {
            position,
            normal,
            tex_coords,
            tangent: Vec4::ZERO,
        }
    }

    /// Componentwise approximate equality over all twelve floats.
    pub fn approx_eq(&self, other: &Self) -> bool {
        (self.position - other.position).abs().max_element() < EQ_TOLERANCE
            && (self.normal - other.normal).abs().max_element() < EQ_TOLERANCE
            && (self.tex_coords - other.tex_coords).abs().max_element() < EQ_TOLERANCE
            && (self.tangent - other.tangent).abs().max_element() < EQ_TOLERANCE
    }

    fn quantize(value: f32) -> i32 {
        (value * QUANTIZE_SCALE).round() as i32
    }

    /// Quantized key used for hashing, merging and ordering. Vertices whose
    /// components differ by less than `1e-5` map to the same key.
    pub fn quantized_key(&self) -> VertexKey {
        VertexKey([
            Self::quantize(self.position.x),
            Self::quantize(self.position.y),
            Self::quantize(self.position.z),
            Self::quantize(self.normal.x),
            Self::quantize(self.normal.y),
            Self::quantize(self.normal.z),
            Self::quantize(self.tex_coords.x),
            Self::quantize(self.tex_coords.y),
            Self::quantize(self.tangent.x),
            Self::quantize(self.tangent.y),
            Self::quantize(self.tangent.z),
            Self::quantize(self.tangent.w),
        ])
    }
}

/// Quantized twelve-component vertex key.
///
/// Equality and ordering are lexicographic over the quantized components.
/// The hash folds the components into a single word so that vertices with
/// equal keys always land in the same bucket regardless of floating slop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VertexKey([i32; 12]);

impl std::hash::Hash for VertexKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        let mut folded: u64 = 0;
        for &component in &self.0 {
            folded ^= (component as u64)
                .wrapping_add(0x9e37_79b9)
                .wrapping_add(folded << 6)
                .wrapping_add(folded >> 2);
        }
        state.write_u64(folded);
    }
}

/// An indexed triangle mesh.
///
/// Indices are 0-based and address `vertices`; every three consecutive
/// entries form one triangle.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Object name from the `o` directive.
    pub name: String,
    /// Active material name from `usemtl`, empty if none was declared.
    pub material: String,
    /// LOD level this mesh belongs to.
    pub lod_level: u32,
    /// Dense per-file mesh index in OBJ source order, starting at 0.
    pub mesh_number: u32,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Texture-map filenames extracted from one `newmtl` block.
#[derive(Debug, Clone, Default)]
pub struct Material {
    pub name: String,
    /// `map_Kd` entries.
    pub diffuse: Vec<String>,
    /// `map_Ks` and `map_Ns` entries.
    pub specular: Vec<String>,
    /// `map_Bump` and `bump` entries.
    pub normal: Vec<String>,
    /// `disp` entries.
    pub height: Vec<String>,
    /// True when any UV range observed for this material exceeds 1.0 in
    /// either axis.
    pub is_tiled: bool,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Raw face-index triple `(v, vt, vn)`, 0-based and rebased against the
/// per-object offset. Absent `vt`/`vn` slots wrap below zero and resolve to
/// out-of-range values that the assembler maps to zeroed attributes.
pub(crate) type FaceTriple = [u32; 3];

/// Per-object parser scratch, discarded before the result is produced.
#[derive(Debug, Default)]
pub(crate) struct TempMesh {
    pub positions: Vec<Vec3>,
    /// Stored v-flipped: `(u, 1 - v)`.
    pub tex_coords: Vec<Vec2>,
    pub normals: Vec<Vec3>,
    pub face_indices: Vec<FaceTriple>,
}

/// One planned file pair at a given LOD level.
#[derive(Debug, Clone, Default)]
pub struct PlanEntry {
    pub obj_path: PathBuf,
    pub mtl_path: PathBuf,
    pub lod_level: u32,
}

/// Per-load working state.
///
/// Each `load_file` call owns one exclusively; the state moves into the
/// worker task and is never shared between concurrent loads.
#[derive(Debug)]
pub(crate) struct LoaderState {
    pub flags: LoadFlags,
    pub path: PathBuf,
    /// MTL library name recorded from `mtllib`, kept for observability.
    pub mtl_file_name: String,
    pub file_plan: Vec<PlanEntry>,
    pub meshes: BTreeMap<u32, Vec<Mesh>>,
    pub combined_meshes: Vec<Mesh>,
    pub materials: BTreeMap<u32, Vec<Material>>,
    /// Scratch for the LOD currently being parsed.
    pub temp_meshes: Vec<TempMesh>,
}

impl LoaderState {
    pub fn new(path: PathBuf, flags: LoadFlags) -> Self {
        Self {
            flags,
            path,
            mtl_file_name: String::new(),
            file_plan: Vec::new(),
            meshes: BTreeMap::new(),
            combined_meshes: Vec::new(),
            materials: BTreeMap::new(),
            temp_meshes: Vec::new(),
        }
    }
}

/// A fully processed model.
#[derive(Debug)]
pub struct Model {
    /// Meshes keyed by LOD level.
    pub meshes: BTreeMap<u32, Vec<Mesh>>,
    /// Materials keyed by LOD level.
    pub materials: BTreeMap<u32, Vec<Material>>,
    /// One concatenated mesh per LOD; empty unless `COMBINE_MESHES` was set.
    pub combined_meshes: Vec<Mesh>,
    /// MTL library name recorded from `mtllib`, if any.
    pub mtl_file_name: String,
    /// The OBJ path this model was loaded from.
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(key: &VertexKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_quantized_key_collapses_near_duplicates() {
        let a = Vertex::new(Vec3::new(1.0, 2.0, 3.0), Vec3::Z, Vec2::ZERO);
        let b = Vertex::new(Vec3::new(1.000_001, 2.0, 3.0), Vec3::Z, Vec2::ZERO);
        assert_eq!(a.quantized_key(), b.quantized_key());
        assert_eq!(hash_of(&a.quantized_key()), hash_of(&b.quantized_key()));
    }

    #[test]
    fn test_quantized_key_separates_distinct_vertices() {
        let a = Vertex::new(Vec3::new(1.0, 2.0, 3.0), Vec3::Z, Vec2::ZERO);
        let b = Vertex::new(Vec3::new(1.001, 2.0, 3.0), Vec3::Z, Vec2::ZERO);
        assert_ne!(a.quantized_key(), b.quantized_key());
    }

    #[test]
    fn test_quantized_key_ordering_is_lexicographic() {
        let a = Vertex::new(Vec3::new(0.0, 9.0, 9.0), Vec3::Z, Vec2::ZERO);
        let b = Vertex::new(Vec3::new(1.0, 0.0, 0.0), Vec3::Z, Vec2::ZERO);
        assert!(a.quantized_key() < b.quantized_key());
    }

    #[test]
    fn test_approx_eq_tolerance() {
        let a = Vertex::new(Vec3::ONE, Vec3::Z, Vec2::ZERO);
        let mut b = a;
        b.position.x += 5e-7;
        assert!(a.approx_eq(&b));

        b.position.x += 1e-5;
        assert!(!a.approx_eq(&b));
    }

    #[test]
    fn test_flags_compose() {
        let flags = LoadFlags::CALCULATE_TANGENTS | LoadFlags::JOIN_IDENTICAL;
        assert!(flags.contains(LoadFlags::CALCULATE_TANGENTS));
        assert!(!flags.contains(LoadFlags::COMBINE_MESHES));
    }
}
