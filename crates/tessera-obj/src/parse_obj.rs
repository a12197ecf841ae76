//! OBJ geometry parser.
//!
//! Two-pass byte walker. The first pass counts per-object directive
//! occurrences so the scratch arrays can be reserved up front; the second
//! pass extracts positions, texture coordinates (v-flipped), normals and
//! face-index triples.
//!
//! OBJ quirks handled here: 1-based indices, per-object index namespaces
//! (each `o` block rebases against the highest raw index seen so far),
//! quads (split along the `(v0, v2)` diagonal), LF/CRLF line endings and
//! tab separators. Directives other than `o`, `v`, `vt`, `vn`, `f`,
//! `usemtl` and `mtllib` are ignored.

use std::path::Path;

use glam::{Vec2, Vec3};
use smallvec::SmallVec;

use crate::error::LoadError;
use crate::scan::{lines, next_token, parse_float, parse_index, token_string};
use crate::types::{FaceTriple, LoaderState, Material, Mesh, TempMesh};

#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    positions: usize,
    tex_coords: usize,
    normals: usize,
    faces: usize,
}

/// Tracks the UV bounding range observed since the last `usemtl` (or object
/// start). Flushing marks the material that was active while the range was
/// observed as tiled when the range exceeds 1.0 in either axis.
struct UvRange {
    min: Vec2,
    max: Vec2,
    any: bool,
}

impl UvRange {
    fn new() -> Self {
        Self {
            min: Vec2::splat(f32::INFINITY),
            max: Vec2::splat(f32::NEG_INFINITY),
            any: false,
        }
    }

    fn include(&mut self, uv: Vec2) {
        self.min = self.min.min(uv);
        self.max = self.max.max(uv);
        self.any = true;
    }

    fn flush(&mut self, materials: &mut [Material], active: Option<usize>) {
        if let (Some(index), true) = (active, self.any) {
            let range = self.max - self.min;
            if range.x > 1.0 || range.y > 1.0 {
                materials[index].is_tiled = true;
            }
        }
        *self = Self::new();
    }
}

/// Parse one OBJ buffer into `state`, appending meshes and scratch arrays
/// for the given LOD level. The LOD's material records must already exist;
/// `usemtl` handling mutates their tiling flag.
pub(crate) fn parse_obj(
    state: &mut LoaderState,
    lod_level: u32,
    buffer: &[u8],
    path: &Path,
) -> Result<(), LoadError> {
    // First pass: reservation hints per `o` block.
    let mut counts: Vec<Counts> = Vec::new();
    for (_, line) in lines(buffer) {
        if line.is_empty() || line[0] == b'#' {
            continue;
        }
        if line.starts_with(b"o ") {
            counts.push(Counts::default());
        } else if line.starts_with(b"v ") {
            implicit_slot(&mut counts).positions += 1;
        } else if line.starts_with(b"vt") {
            implicit_slot(&mut counts).tex_coords += 1;
        } else if line.starts_with(b"vn") {
            implicit_slot(&mut counts).normals += 1;
        } else if line.starts_with(b"f ") {
            implicit_slot(&mut counts).faces += 1;
        }
    }

    state.temp_meshes.clear();
    state.temp_meshes.reserve(counts.len());
    let temps = &mut state.temp_meshes;
    let meshes = state.meshes.entry(lod_level).or_default();
    meshes.reserve(counts.len());
    let materials = state.materials.entry(lod_level).or_default();

    // Second pass: actual parsing.
    let mut current: Option<usize> = None;
    let mut index_offset = [0u32; 3];
    let mut max_index_seen = [0u32; 3];
    let mut uv_range = UvRange::new();
    let mut active_material: Option<usize> = None;

    for (offset, line) in lines(buffer) {
        if line.is_empty() || line[0] == b'#' {
            continue;
        }

        if line.starts_with(b"o ") {
            uv_range = UvRange::new();
            // Carry the highest raw index forward so this object's faces
            // rebase to start at zero.
            index_offset = max_index_seen;
            open_mesh(meshes, temps, &counts, lod_level, token_string(&line[2..]));
            current = Some(meshes.len() - 1);
        } else if line.starts_with(b"v ") {
            let index = ensure_mesh(&mut current, meshes, temps, &counts, lod_level);
            let mut pos = 2;
            let x = read_float(line, &mut pos, path, offset)?;
            let y = read_float(line, &mut pos, path, offset)?;
            let z = read_float(line, &mut pos, path, offset)?;
            temps[index].positions.push(Vec3::new(x, y, z));
        } else if line.starts_with(b"vt") {
            let index = ensure_mesh(&mut current, meshes, temps, &counts, lod_level);
            let mut pos = 2;
            let u = read_float(line, &mut pos, path, offset)?;
            let v = read_float(line, &mut pos, path, offset)?;
            let flipped = Vec2::new(u, 1.0 - v);
            temps[index].tex_coords.push(flipped);
            uv_range.include(flipped);
        } else if line.starts_with(b"vn") {
            let index = ensure_mesh(&mut current, meshes, temps, &counts, lod_level);
            let mut pos = 2;
            let x = read_float(line, &mut pos, path, offset)?;
            let y = read_float(line, &mut pos, path, offset)?;
            let z = read_float(line, &mut pos, path, offset)?;
            temps[index].normals.push(Vec3::new(x, y, z));
        } else if line.starts_with(b"mtllib") {
            state.mtl_file_name = token_string(line.get(7..).unwrap_or(b""));
        } else if line.starts_with(b"usemtl") {
            let index = ensure_mesh(&mut current, meshes, temps, &counts, lod_level);
            let name = String::from_utf8_lossy(line.get(7..).unwrap_or(b""))
                .trim()
                .to_string();
            uv_range.flush(materials, active_material);
            active_material = materials.iter().position(|m| m.name == name);
            meshes[index].material = name;
        } else if line.starts_with(b"f ") {
            let index = ensure_mesh(&mut current, meshes, temps, &counts, lod_level);
            let mut pos = 2;
            let mut corners: SmallVec<[FaceTriple; 4]> = SmallVec::new();
            while let Some(token) = next_token(line, &mut pos) {
                if corners.len() == 4 {
                    break;
                }
                let raw = parse_corner(token)
                    .ok_or_else(|| parse_error(path, offset, "invalid face index"))?;
                for axis in 0..3 {
                    max_index_seen[axis] = max_index_seen[axis].max(raw[axis]);
                }
                // 1-based to 0-based, then rebase into this object's
                // namespace. Absent slots (raw 0) wrap out of range.
                corners.push([
                    raw[0].wrapping_sub(1).wrapping_sub(index_offset[0]),
                    raw[1].wrapping_sub(1).wrapping_sub(index_offset[1]),
                    raw[2].wrapping_sub(1).wrapping_sub(index_offset[2]),
                ]);
            }
            match corners.len() {
                3 => temps[index].face_indices.extend_from_slice(&corners),
                4 => {
                    temps[index].face_indices.extend_from_slice(&[
                        corners[0], corners[1], corners[2], corners[0], corners[2], corners[3],
                    ]);
                }
                _ => return Err(parse_error(path, offset, "truncated face")),
            }
        }
    }

    uv_range.flush(materials, active_material);
    Ok(())
}

fn implicit_slot(counts: &mut Vec<Counts>) -> &mut Counts {
    if counts.is_empty() {
        counts.push(Counts::default());
    }
    let last = counts.len() - 1;
    &mut counts[last]
}

fn open_mesh(
    meshes: &mut Vec<Mesh>,
    temps: &mut Vec<TempMesh>,
    counts: &[Counts],
    lod_level: u32,
    name: String,
) {
    let index = meshes.len();
    meshes.push(Mesh {
        name,
        lod_level,
        mesh_number: index as u32,
        ..Default::default()
    });

    let mut temp = TempMesh::default();
    if let Some(hint) = counts.get(index) {
        temp.positions.reserve(hint.positions);
        temp.tex_coords.reserve(hint.tex_coords);
        temp.normals.reserve(hint.normals);
        temp.face_indices.reserve(hint.faces * 3);
    }
    temps.push(temp);
}

/// Geometry arriving before any `o` directive opens an unnamed mesh.
fn ensure_mesh(
    current: &mut Option<usize>,
    meshes: &mut Vec<Mesh>,
    temps: &mut Vec<TempMesh>,
    counts: &[Counts],
    lod_level: u32,
) -> usize {
    if let Some(index) = *current {
        return index;
    }
    open_mesh(meshes, temps, counts, lod_level, String::new());
    let index = meshes.len() - 1;
    *current = Some(index);
    index
}

fn read_float(
    line: &[u8],
    pos: &mut usize,
    path: &Path,
    offset: usize,
) -> Result<f32, LoadError> {
    let Some(token) = next_token(line, pos) else {
        return Err(parse_error(path, offset, "missing float"));
    };
    parse_float(token).ok_or_else(|| parse_error(path, offset, "invalid float"))
}

/// Parse one face corner of the form `V[/T[/N]]`. Missing or empty `T`/`N`
/// slots resolve to 0.
fn parse_corner(token: &[u8]) -> Option<FaceTriple> {
    let mut components = token.split(|&byte| byte == b'/');
    let v = parse_index(components.next()?)?;
    let vt = match components.next() {
        Some(part) if !part.is_empty() => parse_index(part)?,
        _ => 0,
    };
    let vn = match components.next() {
        Some(part) if !part.is_empty() => parse_index(part)?,
        _ => 0,
    };
    Some([v, vt, vn])
}

fn parse_error(path: &Path, offset: usize, reason: &str) -> LoadError {
    LoadError::Parse {
        path: path.to_path_buf(),
        offset,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LoadFlags;
    use std::path::PathBuf;

    const MISSING: u32 = u32::MAX;

    fn parse(buffer: &[u8]) -> LoaderState {
        let mut state = LoaderState::new(PathBuf::from("test.obj"), LoadFlags::empty());
        parse_obj(&mut state, 0, buffer, Path::new("test.obj")).unwrap();
        state
    }

    #[test]
    fn test_positions_normals_and_flipped_uvs() {
        let state = parse(
            b"o thing\n\
              v 1.0 2.0 3.0\n\
              vt 0.25 0.25\n\
              vn 0.0 0.0 1.0\n",
        );

        let temp = &state.temp_meshes[0];
        assert_eq!(temp.positions, vec![Vec3::new(1.0, 2.0, 3.0)]);
        assert_eq!(temp.tex_coords, vec![Vec2::new(0.25, 0.75)]);
        assert_eq!(temp.normals, vec![Vec3::Z]);

        let mesh = &state.meshes[&0][0];
        assert_eq!(mesh.name, "thing");
        assert_eq!(mesh.mesh_number, 0);
    }

    #[test]
    fn test_quad_splits_along_first_diagonal() {
        let state = parse(
            b"o quad\n\
              v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
              f 1 2 3 4\n",
        );

        let triples = &state.temp_meshes[0].face_indices;
        assert_eq!(triples.len(), 6);
        let vs: Vec<u32> = triples.iter().map(|t| t[0]).collect();
        assert_eq!(vs, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_multi_object_index_rebase() {
        let state = parse(
            b"o first\n\
              v 0 0 0\nv 1 0 0\nv 0 1 0\n\
              f 1/0/0 2/0/0 3/0/0\n\
              o second\n\
              v 0 0 1\nv 1 0 1\nv 0 1 1\n\
              f 4/0/0 5/0/0 6/0/0\n",
        );

        assert_eq!(state.meshes[&0].len(), 2);
        assert_eq!(state.meshes[&0][1].mesh_number, 1);

        // The second object's raw indices 4..6 rebase against the carried
        // maximum of 3 back down to 0..2.
        for (object, temp) in state.temp_meshes.iter().enumerate() {
            let vs: Vec<u32> = temp.face_indices.iter().map(|t| t[0]).collect();
            assert_eq!(vs, vec![0, 1, 2], "object {object}");
        }
    }

    #[test]
    fn test_missing_vt_vn_wrap_out_of_range() {
        let state = parse(
            b"o soup\n\
              v 0 0 0\nv 1 0 0\nv 0 1 0\n\
              f 1 2 3\n",
        );

        for triple in &state.temp_meshes[0].face_indices {
            assert_eq!(triple[1], MISSING);
            assert_eq!(triple[2], MISSING);
        }
    }

    #[test]
    fn test_mtllib_and_usemtl_recorded() {
        let state = parse(
            b"mtllib rocks.mtl\n\
              o rock\n\
              usemtl granite\n",
        );

        assert_eq!(state.mtl_file_name, "rocks.mtl");
        assert_eq!(state.meshes[&0][0].material, "granite");
    }

    #[test]
    fn test_uv_range_marks_active_material_tiled() {
        let mut state = LoaderState::new(PathBuf::from("test.obj"), LoadFlags::empty());
        let materials = state.materials.entry(0).or_default();
        materials.push(Material::new("wide"));
        materials.push(Material::new("narrow"));

        parse_obj(
            &mut state,
            0,
            b"o thing\n\
              usemtl wide\n\
              vt 0.0 0.0\n\
              vt 2.5 0.5\n\
              usemtl narrow\n\
              vt 0.1 0.1\n\
              vt 0.2 0.2\n",
            Path::new("test.obj"),
        )
        .unwrap();

        let materials = &state.materials[&0];
        assert!(materials[0].is_tiled);
        assert!(!materials[1].is_tiled);
    }

    #[test]
    fn test_comments_and_unknown_directives_ignored() {
        let state = parse(
            b"# exported by hand\n\
              o thing\n\
              s off\n\
              g group1\n\
              v 0 0 0\n",
        );

        assert_eq!(state.temp_meshes[0].positions.len(), 1);
    }

    #[test]
    fn test_crlf_line_endings() {
        let state = parse(b"o thing\r\nv 1 2 3\r\nv 4 5 6\r\n");
        assert_eq!(state.temp_meshes[0].positions.len(), 2);
    }

    #[test]
    fn test_geometry_before_first_object_opens_unnamed_mesh() {
        let state = parse(b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");

        let meshes = &state.meshes[&0];
        assert_eq!(meshes.len(), 1);
        assert!(meshes[0].name.is_empty());
        assert_eq!(state.temp_meshes[0].face_indices.len(), 3);
    }

    #[test]
    fn test_malformed_float_is_a_parse_error() {
        let mut state = LoaderState::new(PathBuf::from("bad.obj"), LoadFlags::empty());
        let result = parse_obj(
            &mut state,
            0,
            b"o thing\nv 1.0 oops 3.0\n",
            Path::new("bad.obj"),
        );

        match result {
            Err(LoadError::Parse { offset, .. }) => assert_eq!(offset, 8),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_face_is_a_parse_error() {
        let mut state = LoaderState::new(PathBuf::from("bad.obj"), LoadFlags::empty());
        let result = parse_obj(
            &mut state,
            0,
            b"o thing\nv 0 0 0\nf 1 2\n",
            Path::new("bad.obj"),
        );
        assert!(matches!(result, Err(LoadError::Parse { .. })));
    }

    #[test]
    fn test_exponent_floats() {
        let state = parse(b"o thing\nv 1e-3 2.5e2 -1E1\n");
        assert_eq!(
            state.temp_meshes[0].positions[0],
            Vec3::new(0.001, 250.0, -10.0)
        );
    }
}
