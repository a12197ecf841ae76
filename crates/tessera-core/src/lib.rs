//! # Tessera Core
//!
//! Runtime services shared by the Tessera asset pipeline:
//! - **Pool**: lazy worker pool with per-task arrival timing and one-shot
//!   completion handles
//! - **Log**: thread-safe severity-tagged message sinks
//! - **Timer**: monotonic stopwatch for phase timing

pub mod log;
pub mod pool;
pub mod timer;

pub use log::{ConsoleSink, LogSink, MemorySink, Severity, TracingSink};
pub use pool::{PoolError, TaskHandle, ThreadPool};
pub use timer::Timer;
