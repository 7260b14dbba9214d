//! File engine for editing very large files without loading them into
//! memory: windowed memory-mapped reads behind an LRU cache, a background
//! line-offset index, a patch overlay with undo/redo, and line-streaming
//! search, composed into a line-addressed text buffer.

pub mod buffer;
pub mod config;
pub mod edit;
pub mod error;
pub mod host;
pub mod index;
pub mod io;
pub mod progress;
pub mod search;

pub use buffer::{DocumentEvent, Encoding, LoaderEvent, LoaderThread, TextBuffer};
pub use config::EngineConfig;
pub use edit::history::{History, HistoryState};
pub use edit::{EditOverlay, Patch, PatchKind};
pub use error::{EngineError, Result};
pub use host::{CommandRegistry, HostContext};
pub use index::LineIndex;
pub use io::{FileManager, Window, WindowCache, DEFAULT_WINDOW_LEN, PAGE_SIZE};
pub use progress::{CancelToken, FnSink, ProgressSink};
pub use search::{search, SearchEvent, SearchHit, SearchQuery, SearchStream, SearchThread};
