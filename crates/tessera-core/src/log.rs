//! Log Sinks
//!
//! Thread-safe severity-tagged message sinks. The sink is an explicit
//! collaborator: the pool and the loader hold an `Arc<dyn LogSink>` handle
//! instead of reaching for a process-wide singleton, and tests inject a
//! capturing sink.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

/// Message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug = 0,
    Info = 1,
    Success = 2,
    Warning = 3,
    Error = 4,
}

impl Severity {
    /// Short uppercase tag for console output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Success => "OK",
            Self::Warning => "WARN",
            Self::Error => "ERROR",
        }
    }
}

/// Thread-safe severity-tagged message sink.
///
/// Implementations must be callable from any thread; producers never read
/// log state back.
pub trait LogSink: Send + Sync {
    fn log(&self, severity: Severity, message: &str);
}

struct Entry {
    severity: Severity,
    message: String,
}

struct ConsoleState {
    queue: VecDeque<Entry>,
    shutdown: bool,
}

struct ConsoleShared {
    state: Mutex<ConsoleState>,
    available: Condvar,
    min_severity: Severity,
}

/// Console sink with a dedicated drain thread.
///
/// Producers enqueue under the mutex, signal the condvar and return without
/// blocking on output. Entries below `min_severity` are discarded at the
/// producer. Drop flushes the queue and joins the drain thread.
pub struct ConsoleSink {
    shared: Arc<ConsoleShared>,
    worker: Option<JoinHandle<()>>,
}

impl ConsoleSink {
    pub fn new(min_severity: Severity) -> Self {
        let shared = Arc::new(ConsoleShared {
            state: Mutex::new(ConsoleState {
                queue: VecDeque::new(),
                shutdown: false,
            }),
            available: Condvar::new(),
            min_severity,
        });

        let worker = {
            let shared = Arc::clone(&shared);
            std::thread::Builder::new()
                .name(String::from("log-drain"))
                .spawn(move || Self::drain_loop(&shared))
                .expect("failed to spawn log drain thread")
        };

        Self {
            shared,
            worker: Some(worker),
        }
    }

    fn drain_loop(shared: &ConsoleShared) {
        loop {
            let batch = {
                let mut state = shared.state.lock();
                while state.queue.is_empty() && !state.shutdown {
                    shared.available.wait(&mut state);
                }
                if state.shutdown && state.queue.is_empty() {
                    break;
                }
                std::mem::take(&mut state.queue)
            };

            for entry in batch {
                eprintln!("[{}] {}", entry.severity.label(), entry.message);
            }
        }
    }
}

impl LogSink for ConsoleSink {
    fn log(&self, severity: Severity, message: &str) {
        if severity < self.shared.min_severity {
            return;
        }

        {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                return;
            }
            state.queue.push_back(Entry {
                severity,
                message: message.to_string(),
            });
        }
        self.shared.available.notify_one();
    }
}

impl Drop for ConsoleSink {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
        }
        self.shared.available.notify_all();

        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Adapter that forwards entries to the `tracing` ecosystem.
///
/// For hosts that already run a subscriber; severities map onto the nearest
/// tracing level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Debug => tracing::debug!("{message}"),
            Severity::Info | Severity::Success => tracing::info!("{message}"),
            Severity::Warning => tracing::warn!("{message}"),
            Severity::Error => tracing::error!("{message}"),
        }
    }
}

/// Capturing sink for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(Severity, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every captured entry, in arrival order.
    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.entries.lock().clone()
    }

    /// True if any captured entry carries the given severity.
    pub fn has_severity(&self, severity: Severity) -> bool {
        self.entries.lock().iter().any(|(s, _)| *s == severity)
    }
}

impl LogSink for MemorySink {
    fn log(&self, severity: Severity, message: &str) {
        self.entries.lock().push((severity, message.to_string()));
    }
}
