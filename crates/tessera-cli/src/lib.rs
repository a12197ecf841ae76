//! # Tessera CLI
//!
//! Command-line front end for the Tessera OBJ loader. Schedules every
//! given OBJ path on the loader's worker pool, waits for the handles and
//! prints per-LOD mesh and material statistics.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use tracing_subscriber::filter::LevelFilter;

use tessera_core::log::{ConsoleSink, LogSink, Severity, TracingSink};
use tessera_obj::{LoadFlags, Model, ObjLoader};

/// Wavefront OBJ/MTL loading pipeline
#[derive(Parser)]
#[command(name = "tessera")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// OBJ files to load
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Maximum worker threads (0 = load on the calling thread)
    #[arg(short, long, default_value_t = 4)]
    pub threads: usize,

    /// Derive per-vertex tangents and handedness
    #[arg(long)]
    pub tangents: bool,

    /// Merge vertices identical within tolerance
    #[arg(long)]
    pub join: bool,

    /// Concatenate each LOD into a single mesh
    #[arg(long)]
    pub combine: bool,

    /// Discover `<stem>_lod<k>` sibling files
    #[arg(long)]
    pub lods: bool,

    /// Route log output through a tracing subscriber instead of the
    /// built-in console sink
    #[arg(long)]
    pub trace: bool,

    /// Log everything, including per-task pool scheduling
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn flags(&self) -> LoadFlags {
        let mut flags = LoadFlags::empty();
        if self.tangents {
            flags |= LoadFlags::CALCULATE_TANGENTS;
        }
        if self.join {
            flags |= LoadFlags::JOIN_IDENTICAL;
        }
        if self.combine {
            flags |= LoadFlags::COMBINE_MESHES;
        }
        if self.lods {
            flags |= LoadFlags::LODS;
        }
        flags
    }
}

/// Run the CLI.
pub fn execute(cli: Cli) -> Result<()> {
    let sink: Arc<dyn LogSink> = if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(if cli.verbose {
                LevelFilter::DEBUG
            } else {
                LevelFilter::INFO
            })
            .init();
        Arc::new(TracingSink)
    } else {
        let min_severity = if cli.verbose {
            Severity::Debug
        } else {
            Severity::Info
        };
        Arc::new(ConsoleSink::new(min_severity))
    };
    let loader = ObjLoader::new(cli.threads, sink);
    let flags = cli.flags();

    let mut handles = Vec::with_capacity(cli.paths.len());
    for path in &cli.paths {
        let handle = loader
            .load_file(path, flags)
            .with_context(|| format!("failed to schedule {}", path.display()))?;
        handles.push((path, handle));
    }

    for (path, handle) in handles {
        let model = handle
            .wait()
            .with_context(|| format!("failed to load {}", path.display()))?;
        print_summary(&model);
    }

    Ok(())
}

fn print_summary(model: &Model) {
    println!("{}", model.path.display());
    if !model.mtl_file_name.is_empty() {
        println!("  mtllib: {}", model.mtl_file_name);
    }

    for (lod, meshes) in &model.meshes {
        let vertices: usize = meshes.iter().map(|mesh| mesh.vertices.len()).sum();
        let triangles: usize = meshes.iter().map(|mesh| mesh.indices.len() / 3).sum();
        println!(
            "  lod {lod}: {} mesh(es), {vertices} vertices, {triangles} triangles",
            meshes.len()
        );

        for mesh in meshes {
            println!(
                "    [{}] {} ({} vertices, {} triangles{})",
                mesh.mesh_number,
                if mesh.name.is_empty() {
                    "<unnamed>"
                } else {
                    mesh.name.as_str()
                },
                mesh.vertices.len(),
                mesh.indices.len() / 3,
                if mesh.material.is_empty() {
                    String::new()
                } else {
                    format!(", material {}", mesh.material)
                }
            );
        }

        if let Some(materials) = model.materials.get(lod) {
            for material in materials {
                println!(
                    "    material {}: {} diffuse, {} specular, {} normal, {} height{}",
                    material.name,
                    material.diffuse.len(),
                    material.specular.len(),
                    material.normal.len(),
                    material.height.len(),
                    if material.is_tiled { ", tiled" } else { "" }
                );
            }
        }
    }

    for combined in &model.combined_meshes {
        println!(
            "  combined lod {}: {} vertices, {} triangles",
            combined.lod_level,
            combined.vertices.len(),
            combined.indices.len() / 3
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_mapping() {
        let cli = Cli::parse_from(["tessera", "--tangents", "--join", "cube.obj"]);
        let flags = cli.flags();

        assert!(flags.contains(LoadFlags::CALCULATE_TANGENTS));
        assert!(flags.contains(LoadFlags::JOIN_IDENTICAL));
        assert!(!flags.contains(LoadFlags::COMBINE_MESHES));
        assert!(!flags.contains(LoadFlags::LODS));
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["tessera", "cube.obj"]);
        assert_eq!(cli.threads, 4);
        assert!(!cli.verbose);
        assert_eq!(cli.paths, vec![PathBuf::from("cube.obj")]);
    }
}
