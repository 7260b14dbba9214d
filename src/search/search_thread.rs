use std::path::PathBuf;
use std::thread;

use crossbeam::channel::{bounded, Receiver, Sender};
use tracing::warn;

use crate::buffer::TextBuffer;
use crate::config::EngineConfig;
use crate::edit::Patch;
use crate::error::EngineError;
use crate::progress::CancelToken;

use super::{SearchHit, SearchQuery};

#[derive(Debug)]
enum SearchCommand {
    Search {
        path: PathBuf,
        patches: Vec<Patch>,
        query: SearchQuery,
        cancel: CancelToken,
    },
    Shutdown,
}

/// Events streamed back from the search thread.
#[derive(Debug)]
pub enum SearchEvent {
    Hit(SearchHit),
    /// The search ran to the end of the document.
    Finished { hits: usize },
    Failed(EngineError),
}

/// Runs searches on a dedicated worker thread so a front-end stays
/// responsive while gigabytes of lines are scanned.
///
/// The worker owns a private buffer with its own window cache, so it never
/// contends with the interactive reader. Each request carries a snapshot of
/// the pending patches; hits therefore reflect the document as it looked
/// when the search started, and carry their own line text.
pub struct SearchThread {
    cmd_tx: Sender<SearchCommand>,
    event_rx: Receiver<SearchEvent>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SearchThread {
    pub fn new(config: EngineConfig) -> Self {
        let (cmd_tx, cmd_rx) = bounded::<SearchCommand>(16);
        let (event_tx, event_rx) = bounded::<SearchEvent>(1024);

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
        cmd_rx: Receiver<SearchCommand>,
        event_tx: Sender<SearchEvent>,
    ) {
        let mut buffer = TextBuffer::with_config(&config);
        loop {
            match cmd_rx.recv() {
                Ok(SearchCommand::Search {
                    path,
                    patches,
                    query,
                    cancel,
                }) => {
                    // Reopen only when the target changed; the line index is
                    // reusable across searches of the same document.
                    let same_document = buffer.path() == Some(path.as_path());
                    if !same_document {
                        if let Err(err) = buffer.open(&path, None, &cancel) {
                            if event_tx.send(SearchEvent::Failed(err)).is_err() {
                                break;
                            }
                            continue;
                        }
                    }
                    buffer.clear_edits();
                    for patch in patches {
                        buffer.apply_edit(patch);
                    }

                    let mut hits = 0;
                    let mut failure = None;
                    for hit in super::search(&mut buffer, query, &cancel) {
                        match hit {
                            Ok(hit) => {
                                hits += 1;
                                if event_tx.send(SearchEvent::Hit(hit)).is_err() {
                                    return;
                                }
                            }
                            Err(err) => {
                                failure = Some(err);
                                break;
                            }
                        }
                    }
                    let event = match failure {
                        None => SearchEvent::Finished { hits },
                        Some(err) => SearchEvent::Failed(err),
                    };
                    if event_tx.send(event).is_err() {
                        break;
                    }
                }
                Ok(SearchCommand::Shutdown) | Err(_) => break,
            }
        }
    }

    /// Queues a search of `path`, applying `patches` as the overlay snapshot.
    /// Requests sent after shutdown are dropped.
    pub fn search(
        &self,
        path: impl Into<PathBuf>,
        patches: Vec<Patch>,
        query: SearchQuery,
        cancel: &CancelToken,
    ) {
        let command = SearchCommand::Search {
            path: path.into(),
            patches,
            query,
            cancel: cancel.clone(),
        };
        if self.cmd_tx.send(command).is_err() {
            warn!("search thread is gone; request dropped");
        }
    }

    /// Non-blocking poll for the next search event.
    pub fn try_recv_event(&self) -> Option<SearchEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Blocks until the next search event, or `None` once the thread exits.
    pub fn recv_event(&self) -> Option<SearchEvent> {
        self.event_rx.recv().ok()
    }

    pub fn shutdown(mut self) {
        let _ = self.cmd_tx.send(SearchCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SearchThread {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(SearchCommand::Shutdown);
    }
}
