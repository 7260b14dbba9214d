use std::collections::{HashMap, VecDeque};

use tracing::trace;

use super::window::Window;

/// Fixed-capacity LRU map from aligned offset to mapped window.
///
/// At most one window exists per aligned offset. Evicted or replaced windows
/// are dropped, and thereby unmapped, before the mutating call returns.
#[derive(Debug)]
pub struct WindowCache {
    windows: HashMap<usize, Window>,
    // Offsets ordered least recently used -> most recently used.
    order: VecDeque<usize>,
    capacity: usize,
}

impl WindowCache {
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "window cache capacity must be non-zero");
        Self {
            windows: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.windows.contains_key(&offset)
    }

    /// Looks up the window at `offset`, promoting it to most recently used.
    pub fn get(&mut self, offset: usize) -> Option<&Window> {
        if !self.windows.contains_key(&offset) {
            return None;
        }
        self.touch(offset);
        self.windows.get(&offset)
    }

    /// Inserts a window, evicting the least recently used entry when at
    /// capacity. A previous window at the same offset is released first.
    pub fn insert(&mut self, window: Window) -> &Window {
        let offset = window.offset();
        if let Some(old) = self.windows.insert(offset, window) {
            trace!(offset, len = old.len(), "replacing window");
            drop(old);
            self.touch(offset);
        } else {
            self.order.push_back(offset);
            if self.windows.len() > self.capacity {
                if let Some(lru) = self.order.pop_front() {
                    if let Some(evicted) = self.windows.remove(&lru) {
                        trace!(offset = lru, len = evicted.len(), "evicting window");
                        drop(evicted);
                    }
                }
            }
        }
        &self.windows[&offset]
    }

    /// Removes and releases the window at `offset`, if any.
    pub fn remove(&mut self, offset: usize) {
        if self.windows.remove(&offset).is_some() {
            self.order.retain(|&o| o != offset);
        }
    }

    /// Releases every cached window.
    pub fn clear(&mut self) {
        self.order.clear();
        self.windows.clear();
    }

    /// Cached offsets ordered least recently used -> most recently used.
    pub fn offsets(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().copied()
    }

    fn touch(&mut self, offset: usize) {
        self.order.retain(|&o| o != offset);
        self.order.push_back(offset);
    }
}

#[cfg(test)]
mod tests {
    use super::super::PAGE_SIZE;
    use super::*;
    use std::io::Write;

    fn three_page_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![b'x'; 3 * PAGE_SIZE]).unwrap();
        file.flush().unwrap();
        file
    }

    fn window(file: &tempfile::NamedTempFile, page: usize) -> Window {
        Window::map(file.as_file(), page * PAGE_SIZE, PAGE_SIZE).unwrap()
    }

    #[test]
    fn insert_then_get() {
        let file = three_page_file();
        let mut cache = WindowCache::with_capacity(2);

        cache.insert(window(&file, 0));
        assert_eq!(cache.len(), 1);
        let hit = cache.get(0).unwrap();
        assert_eq!(hit.offset(), 0);
        assert_eq!(hit.len(), PAGE_SIZE);
        assert!(cache.get(PAGE_SIZE).is_none());
    }

    #[test]
    fn eviction_drops_least_recently_used() {
        let file = three_page_file();
        let mut cache = WindowCache::with_capacity(2);

        cache.insert(window(&file, 0));
        cache.insert(window(&file, 1));
        cache.insert(window(&file, 2));

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(0));
        assert!(cache.contains(PAGE_SIZE));
        assert!(cache.contains(2 * PAGE_SIZE));
        assert_eq!(cache.offsets().last(), Some(2 * PAGE_SIZE));
    }

    #[test]
    fn hit_promotes_to_most_recently_used() {
        let file = three_page_file();
        let mut cache = WindowCache::with_capacity(2);

        cache.insert(window(&file, 0));
        cache.insert(window(&file, 1));
        // Touch offset 0, making PAGE_SIZE the eviction candidate.
        cache.get(0);
        cache.insert(window(&file, 2));

        assert!(cache.contains(0));
        assert!(!cache.contains(PAGE_SIZE));
        assert!(cache.contains(2 * PAGE_SIZE));
    }

    #[test]
    fn replace_keeps_single_entry_per_offset() {
        let file = three_page_file();
        let mut cache = WindowCache::with_capacity(2);

        cache.insert(window(&file, 0));
        cache.insert(Window::map(file.as_file(), 0, 2 * PAGE_SIZE).unwrap());

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(0).unwrap().len(), 2 * PAGE_SIZE);
    }

    #[test]
    fn remove_and_clear() {
        let file = three_page_file();
        let mut cache = WindowCache::with_capacity(2);

        cache.insert(window(&file, 0));
        cache.insert(window(&file, 1));
        cache.remove(0);
        assert_eq!(cache.len(), 1);
        assert!(!cache.contains(0));

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.offsets().count(), 0);
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let file = three_page_file();
        let mut cache = WindowCache::with_capacity(1);

        for page in 0..3 {
            cache.insert(window(&file, page));
            assert!(cache.len() <= 1);
        }
        assert!(cache.contains(2 * PAGE_SIZE));
    }
}
