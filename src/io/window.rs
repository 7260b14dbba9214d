use std::fs::File;

use memmap2::MmapOptions;

use crate::error::Result;

use super::PAGE_SIZE;

/// One contiguous page-aligned mapped region of the open file.
///
/// The window owns its OS mapping; dropping the window unmaps it. Callers
/// never keep a window across cache mutations, they copy bytes out instead.
#[derive(Debug)]
pub struct Window {
    offset: usize,
    map: memmap2::Mmap,
}

impl Window {
    /// Maps `len` bytes of `file` starting at the page-aligned `offset`.
    pub(crate) fn map(file: &File, offset: usize, len: usize) -> Result<Self> {
        debug_assert_eq!(offset % PAGE_SIZE, 0);
        debug_assert!(len > 0);
        // SAFETY: the file is opened read-only and the manager keeps the
        // handle alive for as long as any window exists. External mutation of
        // the base file while it is open is excluded by the engine contract.
        let map = unsafe { MmapOptions::new().offset(offset as u64).len(len).map(file)? };
        Ok(Self { offset, map })
    }

    /// Aligned base offset of the window in base-file coordinates.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// End offset (exclusive) in base-file coordinates.
    pub fn end(&self) -> usize {
        self.offset + self.map.len()
    }

    /// Whether the window covers the byte range `[offset, offset + count)`.
    pub fn covers(&self, offset: usize, count: usize) -> bool {
        self.offset <= offset && offset.saturating_add(count) <= self.end()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.map
    }
}
