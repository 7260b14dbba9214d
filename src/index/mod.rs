use std::thread;

use memchr::memchr_iter;
use tracing::info;

use crate::error::{EngineError, Result};
use crate::io::FileManager;
use crate::progress::{CancelToken, ProgressSink};

/// Bytes scanned per chunk while building the index.
pub const CHUNK_LEN: usize = 1024 * 1024;
/// Progress is reported at most once per this many chunks.
const CHUNKS_PER_TICK: usize = 10;

/// Table of byte offsets where each line of the base file begins.
///
/// `offsets[0]` is always 0; every later entry is the offset immediately
/// following a `\n` byte. The table is strictly increasing and read-only
/// once `build` has completed.
#[derive(Debug)]
pub struct LineIndex {
    offsets: Vec<usize>,
    // Whether the newline ending line `i` was preceded by a carriage return.
    crlf: Vec<bool>,
    file_size: usize,
    built: bool,
}

impl LineIndex {
    pub fn new() -> Self {
        Self {
            offsets: vec![0],
            crlf: Vec::new(),
            file_size: 0,
            built: false,
        }
    }

    /// Scans the open file in 1 MiB chunks, recording the offset after every
    /// `\n`. Progress ticks are emitted every 10 chunks and once with 100 on
    /// completion; the build yields cooperatively at each tick. Cancellation
    /// and read failures reset the table to `[0]`.
    pub fn build(
        &mut self,
        files: &mut FileManager,
        progress: Option<&dyn ProgressSink>,
        cancel: &CancelToken,
    ) -> Result<()> {
        if !files.is_open() {
            return Err(EngineError::NotOpen);
        }
        self.reset();
        let file_size = files.file_size();
        self.file_size = file_size;

        let mut offset = 0;
        let mut chunks = 0;
        let mut prev_byte = 0u8;
        while offset < file_size {
            if cancel.is_cancelled() {
                self.reset();
                return Err(EngineError::Cancelled);
            }

            let count = CHUNK_LEN.min(file_size - offset);
            let chunk = match files.read_bytes(offset, count) {
                Ok(chunk) => chunk,
                Err(err) => {
                    self.reset();
                    return Err(err);
                }
            };
            for nl in memchr_iter(b'\n', &chunk) {
                self.offsets.push(offset + nl + 1);
                let before = if nl == 0 { prev_byte } else { chunk[nl - 1] };
                self.crlf.push(before == b'\r');
            }
            prev_byte = chunk[count - 1];
            offset += count;
            chunks += 1;

            if chunks % CHUNKS_PER_TICK == 0 {
                if let Some(sink) = progress {
                    sink.report((offset as f64 / file_size as f64 * 100.0) as u32);
                }
                thread::yield_now();
            }
        }

        if let Some(sink) = progress {
            sink.report(100);
        }
        self.built = true;
        info!(lines = self.offsets.len(), bytes = file_size, "line index built");
        Ok(())
    }

    /// Drops any built state back to the initial single-entry table.
    pub fn reset(&mut self) {
        self.offsets.clear();
        self.offsets.push(0);
        self.crlf.clear();
        self.built = false;
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn line_count(&self) -> usize {
        self.offsets.len()
    }

    /// Byte offset where line `i` begins. Out-of-range indexes clamp to the
    /// start of the file.
    pub fn line_offset(&self, i: usize) -> usize {
        self.offsets.get(i).copied().unwrap_or(0)
    }

    /// The largest line index whose start offset does not exceed `offset`.
    pub fn line_of_offset(&self, offset: usize) -> usize {
        self.offsets
            .binary_search(&offset)
            .unwrap_or_else(|insertion| insertion.saturating_sub(1))
    }

    /// Length in bytes of line `i`, excluding its `\n` or `\r\n` terminator.
    /// The last line runs to the end of the file.
    pub fn line_length(&self, i: usize) -> usize {
        let Some(&start) = self.offsets.get(i) else {
            return 0;
        };
        let end = match self.offsets.get(i + 1) {
            Some(&next) => {
                let terminator = 1 + usize::from(self.crlf.get(i).copied().unwrap_or(false));
                next.saturating_sub(terminator)
            }
            None => self.file_size,
        };
        end.saturating_sub(start).min(self.file_size.saturating_sub(start))
    }
}

impl Default for LineIndex {
    fn default() -> Self {
        Self::new()
    }
}
