//! Asynchronous load orchestration.
//!
//! `ObjLoader` runs path discovery and file reads synchronously on the
//! caller, then moves the owned state onto an internal worker pool where
//! the per-LOD parse/assemble/tangent/dedup pipeline executes. Results come
//! back through futures-style handles, so several assets load in parallel.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tessera_core::log::{LogSink, Severity};
use tessera_core::pool::{TaskHandle, ThreadPool};
use tessera_core::timer::Timer;

use crate::assemble::construct_vertices;
use crate::combine::combine_meshes;
use crate::dedup::join_identical_vertices;
use crate::discover::{cache_file_paths, read_file_to_buffer};
use crate::error::LoadError;
use crate::parse_mtl::parse_mtl;
use crate::parse_obj::parse_obj;
use crate::tangent::calc_tangent_space;
use crate::types::{LoadFlags, LoaderState, Model, PlanEntry};

/// Completion handle for one [`ObjLoader::load_file`] call.
pub struct LoadHandle {
    inner: TaskHandle<Result<Model, LoadError>>,
}

impl LoadHandle {
    /// Block until the load resolves.
    pub fn wait(self) -> Result<Model, LoadError> {
        match self.inner.wait() {
            Ok(result) => result,
            Err(error) => Err(error.into()),
        }
    }

    /// True once the result is available.
    pub fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }
}

/// Asynchronous OBJ/MTL loader.
pub struct ObjLoader {
    pool: ThreadPool,
    sink: Arc<dyn LogSink>,
    total_tasks: AtomicU64,
}

impl ObjLoader {
    /// Create a loader whose pool may grow to `max_threads` workers. With
    /// `max_threads == 0` every load runs inline on the caller.
    pub fn new(max_threads: usize, sink: Arc<dyn LogSink>) -> Self {
        Self {
            pool: ThreadPool::new(max_threads, Arc::clone(&sink)),
            sink,
            total_tasks: AtomicU64::new(0),
        }
    }

    /// Number of pool workers spawned so far.
    pub fn worker_count(&self) -> usize {
        self.pool.thread_count()
    }

    /// Begin loading `path`.
    ///
    /// Discovery and file reads happen synchronously: a missing OBJ fails
    /// this call, a missing MTL logs a warning and yields an empty material
    /// record. Parsing and mesh processing run on the pool; the returned
    /// handle resolves with the finished [`Model`] or the first error.
    pub fn load_file(
        &self,
        path: impl Into<PathBuf>,
        flags: LoadFlags,
    ) -> Result<LoadHandle, LoadError> {
        let cache_timer = Timer::new();
        let mut state = LoaderState::new(path.into(), flags);

        cache_file_paths(&mut state)?;

        let mut obj_buffers: HashMap<u32, Vec<u8>> = HashMap::new();
        let mut mtl_buffers: HashMap<u32, Vec<u8>> = HashMap::new();

        for entry in &state.file_plan {
            let obj = read_file_to_buffer(&entry.obj_path).map_err(|error| {
                if entry.lod_level == 0 {
                    LoadError::Plan {
                        path: entry.obj_path.clone(),
                    }
                } else {
                    error
                }
            })?;
            obj_buffers.insert(entry.lod_level, obj);

            match read_file_to_buffer(&entry.mtl_path) {
                Ok(mtl) => {
                    mtl_buffers.insert(entry.lod_level, mtl);
                }
                Err(_) => {
                    self.sink.log(
                        Severity::Warning,
                        &format!("no mtl found for file: {}", entry.obj_path.display()),
                    );
                    mtl_buffers.insert(entry.lod_level, Vec::new());
                }
            }
        }

        let task_number = self.total_tasks.fetch_add(1, Ordering::Relaxed) + 1;
        let cache_elapsed = cache_timer.elapsed_millis();
        let sink = Arc::clone(&self.sink);

        let inner = self.pool.enqueue(move || {
            process_task(
                state,
                &obj_buffers,
                &mtl_buffers,
                cache_elapsed,
                task_number,
                sink.as_ref(),
            )
        });

        Ok(LoadHandle { inner })
    }
}

fn process_task(
    mut state: LoaderState,
    obj_buffers: &HashMap<u32, Vec<u8>>,
    mtl_buffers: &HashMap<u32, Vec<u8>>,
    cache_elapsed: f64,
    task_number: u64,
    sink: &dyn LogSink,
) -> Result<Model, LoadError> {
    let process_timer = Timer::new();
    sink.log(
        Severity::Info,
        &format!(
            "started loading task #{task_number} - {}",
            state.path.display()
        ),
    );

    match load_file_internal(&mut state, obj_buffers, mtl_buffers) {
        Ok(model) => {
            let total = cache_elapsed + process_timer.elapsed_millis();
            sink.log(
                Severity::Success,
                &format!("loaded task #{task_number} in {total:.3} ms"),
            );
            Ok(model)
        }
        Err(error) => {
            sink.log(
                Severity::Error,
                &format!("error loading {}: {error}", state.path.display()),
            );
            Err(error)
        }
    }
}

/// Run the per-LOD pipeline over the stashed buffers and assemble the
/// model. MTL parses before OBJ so the material records exist when `usemtl`
/// flips their tiling flag.
fn load_file_internal(
    state: &mut LoaderState,
    obj_buffers: &HashMap<u32, Vec<u8>>,
    mtl_buffers: &HashMap<u32, Vec<u8>>,
) -> Result<Model, LoadError> {
    let plan = std::mem::take(&mut state.file_plan);

    for entry in &plan {
        let lod = entry.lod_level;
        let obj = obj_buffers.get(&lod).map(Vec::as_slice).unwrap_or(&[]);
        let mtl = mtl_buffers.get(&lod).map(Vec::as_slice).unwrap_or(&[]);

        parse_mtl(state.materials.entry(lod).or_default(), mtl);
        parse_obj(state, lod, obj, &entry.obj_path)?;

        let meshes = state.meshes.entry(lod).or_default();
        construct_vertices(meshes, &state.temp_meshes);

        if state.flags.contains(LoadFlags::CALCULATE_TANGENTS) {
            calc_tangent_space(meshes);
        }
        if state.flags.contains(LoadFlags::JOIN_IDENTICAL) {
            join_identical_vertices(meshes);
        }
    }

    if state.flags.contains(LoadFlags::COMBINE_MESHES) {
        state.combined_meshes = combine_meshes(&state.meshes);
    }

    state.temp_meshes.clear();

    Ok(Model {
        meshes: std::mem::take(&mut state.meshes),
        materials: std::mem::take(&mut state.materials),
        combined_meshes: std::mem::take(&mut state.combined_meshes),
        mtl_file_name: std::mem::take(&mut state.mtl_file_name),
        path: std::mem::take(&mut state.path),
    })
}

/// Parse one OBJ/MTL pair from in-memory buffers on the calling thread.
///
/// Convenience entry for tools and benchmarks that already hold file
/// contents; applies the same pipeline as a pooled load at LOD 0.
pub fn parse_buffers(obj: &[u8], mtl: &[u8], flags: LoadFlags) -> Result<Model, LoadError> {
    let mut state = LoaderState::new(PathBuf::from("<memory>"), flags);
    state.file_plan = vec![PlanEntry {
        obj_path: PathBuf::from("<memory>"),
        mtl_path: PathBuf::new(),
        lod_level: 0,
    }];

    let obj_buffers = HashMap::from([(0, obj.to_vec())]);
    let mtl_buffers = HashMap::from([(0, mtl.to_vec())]);

    load_file_internal(&mut state, &obj_buffers, &mtl_buffers)
}
