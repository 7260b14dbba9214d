pub mod cache;
pub mod window;

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

pub use cache::WindowCache;
pub use window::Window;

/// Mapping granularity: window offsets are aligned down to this boundary.
pub const PAGE_SIZE: usize = 4096;
/// Default length of a freshly mapped window.
pub const DEFAULT_WINDOW_LEN: usize = 16 * 1024 * 1024;
/// Default number of windows kept mapped at once.
pub const DEFAULT_CACHE_CAPACITY: usize = 10;

#[derive(Debug)]
struct OpenFile {
    file: File,
    size: usize,
    path: PathBuf,
}

/// Owns the read-only handle of the one open file and serves byte ranges out
/// of page-aligned mapped windows. The base content is treated as fixed for
/// as long as the file stays open.
#[derive(Debug)]
pub struct FileManager {
    open: Option<OpenFile>,
    cache: WindowCache,
    window_len: usize,
}

impl FileManager {
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            open: None,
            cache: WindowCache::with_capacity(config.cache_capacity),
            window_len: config.window_len.max(PAGE_SIZE),
        }
    }

    /// Opens `path` read-only and records its size. Any previously open file
    /// is closed first. No mapping is created until the first read.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        self.close();
        let file = File::open(path).map_err(|err| EngineError::from_open(err, path))?;
        let size = file.metadata().map_err(EngineError::Io)?.len() as usize;
        debug!(path = %path.display(), size, "opened file");
        self.open = Some(OpenFile {
            file,
            size,
            path: path.to_path_buf(),
        });
        Ok(())
    }

    /// Releases every cached window, then the file handle. Idempotent.
    pub fn close(&mut self) {
        self.cache.clear();
        if let Some(open) = self.open.take() {
            debug!(path = %open.path.display(), "closed file");
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Size of the open file in bytes; 0 when nothing is open.
    pub fn file_size(&self) -> usize {
        self.open.as_ref().map(|open| open.size).unwrap_or(0)
    }

    pub fn path(&self) -> Option<&Path> {
        self.open.as_ref().map(|open| open.path.as_path())
    }

    /// Read-only view of the window cache.
    pub fn cache(&self) -> &WindowCache {
        &self.cache
    }

    /// Mutable view of the window cache.
    pub fn cache_mut(&mut self) -> &mut WindowCache {
        &mut self.cache
    }

    /// Returns the window covering `[offset, offset + size)`, aligned down to
    /// the page boundary and sized at least the configured window length
    /// (clamped to the end of the file). Windows are cached by their aligned
    /// offset; a cached window that is too short for the request is remapped
    /// larger in place.
    pub fn get_window(&mut self, offset: usize, size: Option<usize>) -> Result<&Window> {
        let open = self.open.as_ref().ok_or(EngineError::NotOpen)?;
        let file_size = open.size;
        let requested = size.unwrap_or(0);
        if offset.saturating_add(requested) > file_size {
            return Err(EngineError::OutOfBounds {
                offset,
                count: requested,
                size: file_size,
            });
        }

        let aligned = offset - offset % PAGE_SIZE;
        let needed = offset - aligned + requested;
        let len = needed.max(self.window_len).min(file_size - aligned);
        if len == 0 {
            // Zero bytes remain past `aligned`; there is nothing to map.
            return Err(EngineError::OutOfBounds {
                offset,
                count: requested,
                size: file_size,
            });
        }

        let covered = self
            .cache
            .get(aligned)
            .map(|window| window.len() >= needed)
            .unwrap_or(false);
        if !covered {
            match Window::map(&open.file, aligned, len) {
                Ok(window) => {
                    self.cache.insert(window);
                }
                Err(err) => {
                    // A mapping failure leaves the manager closed.
                    self.close();
                    return Err(err);
                }
            }
        }

        // The entry was either a covering hit or inserted just above.
        self.cache.get(aligned).ok_or(EngineError::NotOpen)
    }

    /// Copies `count` bytes starting at `offset` out of the covering window.
    pub fn read_bytes(&mut self, offset: usize, count: usize) -> Result<Vec<u8>> {
        let file_size = match &self.open {
            Some(open) => open.size,
            None => return Err(EngineError::NotOpen),
        };
        if offset.saturating_add(count) > file_size {
            return Err(EngineError::OutOfBounds {
                offset,
                count,
                size: file_size,
            });
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let window = self.get_window(offset, Some(count))?;
        let start = offset - window.offset();
        Ok(window.as_slice()[start..start + count].to_vec())
    }
}

impl Default for FileManager {
    fn default() -> Self {
        Self::new()
    }
}
