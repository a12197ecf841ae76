//! # Tessera OBJ
//!
//! Asynchronous Wavefront OBJ/MTL loading pipeline.
//!
//! ## Features
//! - Two-pass byte-walking OBJ and MTL parsers (multi-object files, quads,
//!   per-object index namespaces)
//! - Optional `<stem>_lod<k>` sibling discovery for level-of-detail chains
//! - Area-weighted tangent-space derivation with handedness recovery
//! - Tolerance-aware vertex deduplication with stable index remapping
//! - Per-LOD mesh combination into single draw-call-friendly buffers
//! - Parallel loads over a lazy worker pool with futures-style handles
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use tessera_core::log::{ConsoleSink, Severity};
//! use tessera_obj::{LoadFlags, ObjLoader};
//!
//! let sink = Arc::new(ConsoleSink::new(Severity::Info));
//! let loader = ObjLoader::new(4, sink);
//! let handle = loader
//!     .load_file("assets/rock.obj", LoadFlags::CALCULATE_TANGENTS | LoadFlags::JOIN_IDENTICAL)
//!     .expect("schedule load");
//! let model = handle.wait().expect("load rock.obj");
//! println!("{} meshes at LOD 0", model.meshes[&0].len());
//! ```

mod assemble;
mod combine;
mod dedup;
mod discover;
mod parse_mtl;
mod parse_obj;
mod scan;
mod tangent;

pub mod error;
pub mod loader;
pub mod types;

pub use error::LoadError;
pub use loader::{parse_buffers, LoadHandle, ObjLoader};
pub use types::{LoadFlags, Material, Mesh, Model, PlanEntry, Vertex, VertexKey};
