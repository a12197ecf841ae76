//! File-plan discovery and raw file reading.
//!
//! Resolves the base OBJ + sibling MTL pair and, when LOD discovery is
//! enabled, any `<stem>_lod<k>` variants in the same directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LoadError;
use crate::types::{LoadFlags, LoaderState, PlanEntry};

/// Read a file into a contiguous byte buffer. No decoding; the parsers
/// operate on raw bytes.
pub(crate) fn read_file_to_buffer(path: &Path) -> Result<Vec<u8>, LoadError> {
    fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Populate the state's file plan.
///
/// The base entry is LOD 0 with the sibling `<stem>.mtl` path, reported
/// even if that file does not exist; the reader surfaces a warning later.
/// With [`LoadFlags::LODS`] set, directory entries whose stem is
/// `<stem>_lod<k>` fill slot `k` by extension. Non-numeric suffixes and
/// unknown extensions are skipped. The resulting plan is dense and ordered
/// by LOD level; gaps keep empty paths.
pub(crate) fn cache_file_paths(state: &mut LoaderState) -> Result<(), LoadError> {
    let dir: PathBuf = match state.path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let stem = state
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut plan = vec![PlanEntry {
        obj_path: state.path.clone(),
        mtl_path: dir.join(format!("{stem}.mtl")),
        lod_level: 0,
    }];

    if state.flags.contains(LoadFlags::LODS) {
        let entries = fs::read_dir(&dir).map_err(|_| LoadError::Plan {
            path: state.path.clone(),
        })?;
        let marker = format!("{stem}_lod");

        for entry in entries {
            let Ok(entry) = entry else {
                continue;
            };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(entry_stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(suffix) = entry_stem.strip_prefix(&marker) else {
                continue;
            };
            // Non-numeric suffix means this is not a LOD of our asset.
            let Ok(lod) = suffix.parse::<u32>() else {
                continue;
            };

            let slot = lod as usize;
            if plan.len() <= slot {
                plan.resize_with(slot + 1, PlanEntry::default);
            }
            let extension = path.extension().and_then(|e| e.to_str());
            if extension == Some("obj") {
                plan[slot].obj_path = path;
            } else if extension == Some("mtl") {
                plan[slot].mtl_path = path;
            }
        }

        for (level, entry) in plan.iter_mut().enumerate() {
            entry.lod_level = level as u32;
        }
    }

    state.file_plan = plan;
    Ok(())
}
