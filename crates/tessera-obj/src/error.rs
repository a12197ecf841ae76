//! Loader error types.

use std::path::PathBuf;

use thiserror::Error;

use tessera_core::pool::PoolError;

/// Errors raised by the loading pipeline.
#[derive(Error, Debug)]
pub enum LoadError {
    /// File open or read failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed OBJ content. `offset` is the byte offset of the offending
    /// line within the file.
    #[error("parse error in {} at byte {offset}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        offset: usize,
        reason: String,
    },

    /// The primary OBJ path is missing or unreadable.
    #[error("no loadable OBJ at {}", path.display())]
    Plan { path: PathBuf },

    /// Enqueue attempted after the worker pool shut down.
    #[error("loader worker pool is shut down")]
    PoolClosed,

    /// The processing task died before resolving its handle.
    #[error("load task failed: {0}")]
    TaskFailed(String),
}

impl From<PoolError> for LoadError {
    fn from(value: PoolError) -> Self {
        match value {
            PoolError::Closed => Self::PoolClosed,
            PoolError::Panicked(message) => Self::TaskFailed(message),
        }
    }
}
