pub mod encoding;
pub mod loader;


use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crossbeam::channel::{unbounded, Receiver, Sender};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::edit::history::{History, HistoryState};
use crate::edit::{EditOverlay, Patch};
use crate::error::{EngineError, Result};
use crate::index::LineIndex;
use crate::io::FileManager;
use crate::progress::{CancelToken, ProgressSink};
use crate::search::{self, SearchQuery, SearchStream};

pub use encoding::Encoding;
pub use loader::{LoaderEvent, LoaderThread};

/// Lines written between cancellation checks while saving.
const SAVE_CANCEL_STRIDE: usize = 1000;

/// Lifecycle notifications consumed by a plugin host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    Opened { path: PathBuf },
    Closed { path: PathBuf },
}

/// Line-addressed view over one open file.
///
/// Composes the mapped base bytes, the line-offset index, the decoded text
/// and the pending edit overlay into per-line strings. The buffer is the
/// single owner of all of them; every mutation flows through it.
#[derive(Debug)]
pub struct TextBuffer {
    files: FileManager,
    index: LineIndex,
    overlay: EditOverlay,
    history: History,
    encoding: Encoding,
    path: Option<PathBuf>,
    events: Vec<Sender<DocumentEvent>>,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            files: FileManager::with_config(config),
            index: LineIndex::new(),
            overlay: EditOverlay::new(),
            history: History::new(),
            encoding: config.encoding,
            path: None,
            events: Vec::new(),
        }
    }

    /// Registers a listener for document open/close notifications.
    pub fn subscribe(&mut self) -> Receiver<DocumentEvent> {
        let (tx, rx) = unbounded();
        self.events.push(tx);
        rx
    }

    /// Opens `path` and builds the line index. Any previously open document
    /// is closed first and pending edits are discarded. On any failure after
    /// the file was opened, the file is closed again before returning.
    pub fn open(
        &mut self,
        path: &Path,
        progress: Option<&dyn ProgressSink>,
        cancel: &CancelToken,
    ) -> Result<()> {
        self.close();
        self.files.open(path)?;
        if let Err(err) = self.index.build(&mut self.files, progress, cancel) {
            self.files.close();
            self.index.reset();
            return Err(err);
        }
        self.path = Some(path.to_path_buf());
        self.emit(DocumentEvent::Opened {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    /// Closes the document, releasing every window before the file handle,
    /// and discards the index, overlay and history. Idempotent.
    pub fn close(&mut self) {
        if let Some(path) = self.path.take() {
            self.emit(DocumentEvent::Closed { path });
        }
        self.files.close();
        self.index.reset();
        self.overlay.clear();
        self.history.clear();
    }

    pub fn is_open(&self) -> bool {
        self.files.is_open()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn file_size(&self) -> usize {
        self.files.file_size()
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn line_count(&self) -> usize {
        if self.is_open() {
            self.index.line_count()
        } else {
            0
        }
    }

    /// Byte offset where line `i` begins in base coordinates.
    pub fn line_offset(&self, i: usize) -> usize {
        self.index.line_offset(i)
    }

    /// Line containing the base-file byte `offset`.
    pub fn line_of_offset(&self, offset: usize) -> usize {
        self.index.line_of_offset(offset)
    }

    /// Line `i` as decoded text with overlapping overlay edits applied.
    /// Out-of-range lines are empty; a failed windowed read degrades to
    /// empty text rather than failing the caller.
    pub fn read_line(&mut self, i: usize) -> String {
        if !self.is_open() || i >= self.index.line_count() {
            return String::new();
        }
        let offset = self.index.line_offset(i);
        let len = self.index.line_length(i);
        let bytes = match self.files.read_bytes(offset, len) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(line = i, error = %err, "line read failed");
                return String::new();
            }
        };
        let text = self.encoding.decode(&bytes);
        self.overlay.apply(&text, offset)
    }

    /// Lazily yields lines `start .. start + count`, clamped to the document.
    pub fn visible_lines(&mut self, start: usize, count: usize) -> impl Iterator<Item = String> + '_ {
        let end = start.saturating_add(count).min(self.line_count());
        (start..end).map(move |i| self.read_line(i))
    }

    /// The single mutation entry point: stages `patch` in the overlay.
    pub fn apply_edit(&mut self, patch: Patch) {
        self.overlay.add(patch);
    }

    /// Records `patch` for undo, capturing the base text its original range
    /// covers. Call after (or without) `apply_edit`; `record_edit` does both.
    pub fn record(&mut self, patch: Patch) {
        let original = self.base_text(patch.start, patch.original_len);
        self.history.record(patch, original);
    }

    /// Applies `patch` and records it for undo in one step.
    pub fn record_edit(&mut self, patch: Patch) {
        let original = self.base_text(patch.start, patch.original_len);
        self.overlay.add(patch.clone());
        self.history.record(patch, original);
    }

    /// Discards all pending edits along with the undo/redo history.
    pub fn clear_edits(&mut self) {
        self.overlay.clear();
        self.history.clear();
    }

    pub fn undo(&mut self) -> Option<Patch> {
        self.history.undo(&mut self.overlay)
    }

    pub fn redo(&mut self) -> Option<Patch> {
        self.history.redo(&mut self.overlay)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Registers a watcher for undo/redo availability changes.
    pub fn history_updates(&mut self) -> Receiver<HistoryState> {
        self.history.subscribe()
    }

    /// Direct access to the pending patches.
    pub fn overlay(&self) -> &EditOverlay {
        &self.overlay
    }

    /// Streams search hits for `query` over every line, ascending.
    pub fn search(&mut self, query: SearchQuery, cancel: &CancelToken) -> SearchStream<'_> {
        search::search(self, query, cancel)
    }

    /// Writes the effective document to `path`: every line through the
    /// overlay, separated by `\n`, UTF-8 encoded, streamed into a temporary
    /// file that is renamed over the target on success.
    pub fn save(&mut self, path: &Path, cancel: &CancelToken) -> Result<()> {
        if !self.is_open() {
            return Err(EngineError::NotOpen);
        }
        let tmp = path.with_extension("tmp");
        let file = File::create(&tmp)?;
        let mut writer = BufWriter::with_capacity(8 * 1024 * 1024, file);

        let result = self
            .write_lines(&mut writer, cancel)
            .and_then(|()| writer.flush().map_err(EngineError::from));
        drop(writer);

        match result {
            Ok(()) => {
                fs::rename(&tmp, path)?;
                debug!(path = %path.display(), lines = self.line_count(), "saved document");
                Ok(())
            }
            Err(err) => {
                let _ = fs::remove_file(&tmp);
                Err(err)
            }
        }
    }

    fn write_lines(&mut self, writer: &mut BufWriter<File>, cancel: &CancelToken) -> Result<()> {
        let line_count = self.index.line_count();
        for i in 0..line_count {
            if i % SAVE_CANCEL_STRIDE == 0 && cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            if i > 0 {
                writer.write_all(b"\n")?;
            }
            let line = self.read_line(i);
            writer.write_all(line.as_bytes())?;
        }
        Ok(())
    }

    /// Decoded base-file text for `[start, start + len)`, clamped to the
    /// file. Used to capture original text before a patch is recorded.
    fn base_text(&mut self, start: usize, len: usize) -> String {
        if len == 0 {
            return String::new();
        }
        let size = self.files.file_size();
        let start = start.min(size);
        let count = len.min(size - start);
        match self.files.read_bytes(start, count) {
            Ok(bytes) => self.encoding.decode(&bytes),
            Err(err) => {
                warn!(offset = start, error = %err, "original-text capture failed");
                String::new()
            }
        }
    }

    fn emit(&mut self, event: DocumentEvent) {
        self.events.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}
