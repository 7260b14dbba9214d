use crate::buffer::Encoding;
use crate::io::{DEFAULT_CACHE_CAPACITY, DEFAULT_WINDOW_LEN};

/// Tunables a front-end forwards from its settings store at construction
/// time. Nothing here is persisted by the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of mapped windows kept alive at once.
    pub cache_capacity: usize,
    /// Length of a freshly mapped window, in bytes.
    pub window_len: usize,
    /// Decoding applied to line reads.
    pub encoding: Encoding,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            window_len: DEFAULT_WINDOW_LEN,
            encoding: Encoding::Utf8,
        }
    }
}

impl EngineConfig {
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_window_len(mut self, window_len: usize) -> Self {
        self.window_len = window_len;
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}
