use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between the owner of a task and the
/// task itself. Raising the flag makes the task bail out at its next
/// suspension point with `EngineError::Cancelled`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Destination for integer percentage reports (0..=100) emitted by
/// long-running tasks. Sinks are invoked only from within the task itself.
pub trait ProgressSink {
    fn report(&self, percent: u32);
}

/// The poll-from-the-frontend pattern: the task stores the percentage, the
/// owner reads it whenever it redraws.
impl ProgressSink for AtomicU32 {
    fn report(&self, percent: u32) {
        self.store(percent, Ordering::Relaxed);
    }
}

impl ProgressSink for Arc<AtomicU32> {
    fn report(&self, percent: u32) {
        self.store(percent, Ordering::Relaxed);
    }
}

/// Adapter turning a closure into a progress sink.
pub struct FnSink<F: Fn(u32)>(pub F);

impl<F: Fn(u32)> ProgressSink for FnSink<F> {
    fn report(&self, percent: u32) {
        (self.0)(percent)
    }
}
