use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failure kinds surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("access denied: {}", .0.display())]
    AccessDenied(PathBuf),

    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),

    /// A read of `count` bytes at `offset` would run past the end of the
    /// file. Short reads are never returned silently.
    #[error("read of {count} bytes at offset {offset} exceeds file size {size}")]
    OutOfBounds {
        offset: usize,
        count: usize,
        size: usize,
    },

    #[error("no file is open")]
    NotOpen,

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid search pattern: {0}")]
    BadPattern(String),

    /// A line or window was too large to materialize.
    #[error("out of memory")]
    OutOfMemory,
}

impl EngineError {
    /// Maps an open-time OS error to the matching kind.
    pub(crate) fn from_open(err: io::Error, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::AccessDenied(path.to_path_buf()),
            _ => Self::Io(err),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
