use crossbeam::channel::{unbounded, Receiver, Sender};

use super::{EditOverlay, Patch, PatchKind};

/// One recorded edit: the patch as applied plus the base text it displaced,
/// captured at record time so deletes and replaces invert losslessly.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub patch: Patch,
    pub original_text: String,
}

impl Recorded {
    /// The patch that reverses this edit.
    fn inverse(&self) -> Patch {
        match self.patch.kind {
            PatchKind::Insert => Patch::delete(self.patch.start, self.patch.new_text.len()),
            PatchKind::Delete => Patch::insert(self.patch.start, self.original_text.clone()),
            PatchKind::Replace => Patch::replace(
                self.patch.start,
                self.patch.new_text.len(),
                self.original_text.clone(),
            ),
        }
    }
}

/// Snapshot emitted whenever undo/redo availability may have changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryState {
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Undo and redo stacks over the edit overlay.
///
/// Undoing applies the inverse of the most recent patch to the overlay and
/// moves the entry onto the redo stack; redoing re-applies the original
/// patch. Recording a new edit always clears the redo stack.
#[derive(Debug, Default)]
pub struct History {
    undo: Vec<Recorded>,
    redo: Vec<Recorded>,
    watchers: Vec<Sender<HistoryState>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes an applied patch onto the undo stack. `original_text` is the
    /// decoded base-file text covered by the patch's original range, read
    /// before the patch took effect.
    pub fn record(&mut self, patch: Patch, original_text: String) {
        self.undo.push(Recorded {
            patch,
            original_text,
        });
        self.redo.clear();
        self.notify();
    }

    /// Reverses the most recent edit through `overlay`. Returns the patch
    /// that was undone, or `None` when the undo stack is empty.
    pub fn undo(&mut self, overlay: &mut EditOverlay) -> Option<Patch> {
        let entry = self.undo.pop()?;
        overlay.add(entry.inverse());
        let patch = entry.patch.clone();
        self.redo.push(entry);
        self.notify();
        Some(patch)
    }

    /// Re-applies the most recently undone edit through `overlay`.
    pub fn redo(&mut self, overlay: &mut EditOverlay) -> Option<Patch> {
        let entry = self.redo.pop()?;
        overlay.add(entry.patch.clone());
        let patch = entry.patch.clone();
        self.undo.push(entry);
        self.notify();
        Some(patch)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Empties both stacks.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.notify();
    }

    /// Registers a watcher for undo/redo availability changes. Front-ends
    /// poll the receiver; disconnected watchers are dropped on the next
    /// notification.
    pub fn subscribe(&mut self) -> Receiver<HistoryState> {
        let (tx, rx) = unbounded();
        let _ = tx.send(self.state());
        self.watchers.push(tx);
        rx
    }

    pub fn state(&self) -> HistoryState {
        HistoryState {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }

    fn notify(&mut self) {
        let state = self.state();
        self.watchers.retain(|tx| tx.send(state).is_ok());
    }
}
