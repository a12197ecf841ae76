//! Worker Pool
//!
//! Bounded pool with lazy thread spawn, idle-thread accounting and per-task
//! arrival timing. Enqueued tasks resolve through one-shot completion
//! handles; a pool created with zero threads degrades to inline execution
//! on the caller.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel::{bounded, Receiver};
use parking_lot::{Condvar, Mutex};
use thiserror::Error;

use crate::log::{LogSink, Severity};
use crate::timer::Timer;

/// Errors surfaced through a [`TaskHandle`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The pool had already shut down when the task was enqueued.
    #[error("worker pool is shut down")]
    Closed,

    /// The task payload panicked.
    #[error("task panicked: {0}")]
    Panicked(String),
}

/// One-shot completion handle for an enqueued task.
pub struct TaskHandle<T> {
    rx: Receiver<Result<T, PoolError>>,
    rejected: bool,
}

impl<T> TaskHandle<T> {
    /// Block until the task resolves.
    pub fn wait(self) -> Result<T, PoolError> {
        if self.rejected {
            return Err(PoolError::Closed);
        }
        match self.rx.recv() {
            Ok(result) => result,
            Err(_) => Err(PoolError::Panicked(String::from(
                "task dropped without resolving",
            ))),
        }
    }

    /// True once a result is waiting to be collected.
    pub fn is_ready(&self) -> bool {
        self.rejected || !self.rx.is_empty()
    }
}

struct QueuedTask {
    run: Box<dyn FnOnce() + Send>,
    arrival: Timer,
    task_number: u64,
}

struct PoolState {
    queue: VecDeque<QueuedTask>,
    idle_threads: usize,
    shutdown: bool,
    workers: Vec<JoinHandle<()>>,
}

struct PoolShared {
    state: Mutex<PoolState>,
    available: Condvar,
    sink: Arc<dyn LogSink>,
    max_threads: usize,
    pre_spawn: usize,
}

/// Worker pool with lazy thread spawn.
///
/// `pre_spawn` workers start at construction; further workers spawn one at
/// a time whenever a task arrives while every running worker is busy, up to
/// `max_threads`. With `max_threads == 0` (or no detectable hardware
/// concurrency) tasks run inline on the calling thread.
pub struct ThreadPool {
    shared: Arc<PoolShared>,
    total_tasks: AtomicU64,
    inline: bool,
}

impl ThreadPool {
    /// Create a pool allowing at most `max_threads` workers, clamped to the
    /// hardware concurrency.
    pub fn new(max_threads: usize, sink: Arc<dyn LogSink>) -> Self {
        let hw = std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(0);
        let inline = max_threads == 0 || hw == 0;
        let max_threads = if inline { 0 } else { max_threads.min(hw) };
        let pre_spawn = if inline {
            0
        } else {
            max_threads.min((max_threads / 2).max(1))
        };

        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState {
                queue: VecDeque::new(),
                idle_threads: 0,
                shutdown: false,
                workers: Vec::new(),
            }),
            available: Condvar::new(),
            sink,
            max_threads,
            pre_spawn,
        });

        let pool = Self {
            shared,
            total_tasks: AtomicU64::new(0),
            inline,
        };

        if !inline {
            let mut state = pool.shared.state.lock();
            for _ in 0..pre_spawn {
                spawn_worker(&pool.shared, &mut state);
            }
        }

        pool
    }

    /// Effective worker cap after hardware clamping. Zero for inline pools.
    pub fn max_threads(&self) -> usize {
        self.shared.max_threads
    }

    /// Number of workers started at construction.
    pub fn pre_spawned(&self) -> usize {
        self.shared.pre_spawn
    }

    /// Number of workers spawned so far.
    pub fn thread_count(&self) -> usize {
        self.shared.state.lock().workers.len()
    }

    /// Enqueue a task, returning a handle that resolves with its result.
    ///
    /// On an inline pool the task runs immediately and the returned handle
    /// is already fulfilled. After shutdown the task is rejected with a
    /// warning and the handle resolves to [`PoolError::Closed`]. A payload
    /// panic is captured and delivered through the handle; the worker that
    /// ran it keeps serving the queue.
    pub fn enqueue<T, F>(&self, f: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = bounded(1);
        let run: Box<dyn FnOnce() + Send> = Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(f))
                .map_err(|payload| PoolError::Panicked(panic_message(payload.as_ref())));
            let _ = tx.send(result);
        });

        if self.inline {
            run();
            return TaskHandle {
                rx,
                rejected: false,
            };
        }

        {
            let mut state = self.shared.state.lock();
            let task_number = self.total_tasks.fetch_add(1, Ordering::Relaxed) + 1;

            if state.shutdown {
                self.shared.sink.log(
                    Severity::Warning,
                    &format!("rejected task #{task_number}: pool is shut down"),
                );
                return TaskHandle { rx, rejected: true };
            }

            state.queue.push_back(QueuedTask {
                run,
                arrival: Timer::new(),
                task_number,
            });

            if state.idle_threads == 0 && state.workers.len() < self.shared.max_threads {
                spawn_worker(&self.shared, &mut state);
            }
        }
        self.shared.available.notify_one();

        TaskHandle {
            rx,
            rejected: false,
        }
    }

    /// Signal shutdown and join every worker. Tasks already queued drain
    /// normally; new enqueue attempts are rejected.
    pub fn shutdown(&self) {
        if self.inline {
            return;
        }
        let workers = {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            std::mem::take(&mut state.workers)
        };
        self.shared.available.notify_all();

        for worker in workers {
            let _ = worker.join();
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_worker(shared: &Arc<PoolShared>, state: &mut PoolState) {
    let worker_id = state.workers.len();
    let shared = Arc::clone(shared);
    let handle = std::thread::Builder::new()
        .name(worker_name(worker_id))
        .spawn(move || worker_loop(&shared, worker_id))
        .expect("failed to spawn pool worker");
    state.workers.push(handle);
}

/// Display identity for a worker. The pool owns this formatting; sinks know
/// nothing about tasks or workers.
fn worker_name(worker_id: usize) -> String {
    format!("pool-worker-{worker_id}")
}

fn worker_loop(shared: &PoolShared, worker_id: usize) {
    loop {
        let task = {
            let mut state = shared.state.lock();
            state.idle_threads += 1;
            while !state.shutdown && state.queue.is_empty() {
                shared.available.wait(&mut state);
            }
            state.idle_threads -= 1;

            if state.shutdown && state.queue.is_empty() {
                break;
            }
            let Some(task) = state.queue.pop_front() else {
                break;
            };
            task
        };

        let wait_ms = task.arrival.elapsed_millis();
        let name = worker_name(worker_id);
        let n = task.task_number;
        let message = if n <= shared.pre_spawn as u64 {
            format!("task #{n} assigned to already running thread: {name}")
        } else if n <= shared.max_threads as u64 {
            format!("task #{n} waited {wait_ms:.3} ms before starting on new thread: {name}")
        } else {
            format!("task #{n} waited {wait_ms:.3} ms in queue before starting on thread: {name}")
        };
        shared.sink.log(Severity::Debug, &message);

        (task.run)();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("opaque panic payload")
    }
}
