use std::path::PathBuf;
use std::thread;

use crossbeam::channel::{bounded, Receiver, Sender};
use tracing::warn;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::progress::{CancelToken, ProgressSink};

use super::TextBuffer;

#[derive(Debug)]
enum LoaderCommand {
    Open { path: PathBuf, cancel: CancelToken },
    Shutdown,
}

/// Events streamed back from the loader thread while a document opens.
#[derive(Debug)]
pub enum LoaderEvent {
    Progress(u32),
    Opened(Box<TextBuffer>),
    Failed(EngineError),
}

/// Forwards index-build progress onto the event channel.
struct ChannelProgress(Sender<LoaderEvent>);

impl ProgressSink for ChannelProgress {
    fn report(&self, percent: u32) {
        let _ = self.0.send(LoaderEvent::Progress(percent));
    }
}

/// Opens documents on a dedicated worker thread so a front-end event loop
/// never blocks on multi-gigabyte index builds. The finished buffer is
/// handed back whole through the event channel.
pub struct LoaderThread {
    cmd_tx: Sender<LoaderCommand>,
    event_rx: Receiver<LoaderEvent>,
    handle: Option<thread::JoinHandle<()>>,
}

impl LoaderThread {
    pub fn new(config: EngineConfig) -> Self {
        let (cmd_tx, cmd_rx) = bounded::<LoaderCommand>(16);
        let (event_tx, event_rx) = bounded::<LoaderEvent>(128);

        let handle = thread::spawn(move || {
            Self::worker(config, cmd_rx, event_tx);
        });

        Self {
            cmd_tx,
            event_rx,
            handle: Some(handle),
        }
    }

    fn worker(
        config: EngineConfig,
        cmd_rx: Receiver<LoaderCommand>,
        event_tx: Sender<LoaderEvent>,
    ) {
        loop {
            match cmd_rx.recv() {
                Ok(LoaderCommand::Open { path, cancel }) => {
                    let mut buffer = TextBuffer::with_config(&config);
                    let progress = ChannelProgress(event_tx.clone());
                    let result = buffer.open(&path, Some(&progress), &cancel);
                    let event = match result {
                        Ok(()) => LoaderEvent::Opened(Box::new(buffer)),
                        Err(err) => LoaderEvent::Failed(err),
                    };
                    if event_tx.send(event).is_err() {
                        break;
                    }
                }
                Ok(LoaderCommand::Shutdown) | Err(_) => break,
            }
        }
    }

    /// Queues a document open. The `cancel` token aborts the index build;
    /// requests sent after shutdown are dropped.
    pub fn open(&self, path: impl Into<PathBuf>, cancel: &CancelToken) {
        let command = LoaderCommand::Open {
            path: path.into(),
            cancel: cancel.clone(),
        };
        if self.cmd_tx.send(command).is_err() {
            warn!("loader thread is gone; open request dropped");
        }
    }

    /// Non-blocking poll for the next loader event.
    pub fn try_recv_event(&self) -> Option<LoaderEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Blocks until the next loader event, or `None` once the thread exits.
    pub fn recv_event(&self) -> Option<LoaderEvent> {
        self.event_rx.recv().ok()
    }

    pub fn shutdown(mut self) {
        let _ = self.cmd_tx.send(LoaderCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for LoaderThread {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(LoaderCommand::Shutdown);
    }
}
