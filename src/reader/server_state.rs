//! Server-side reader state fetched once a document is ready
//!
//! Saved progress and the bookmark set come from the backend. Both requests
//! run on a worker thread; the shell polls for the result on every tick so
//! a slow backend never holds up drawing.

use std::sync::Arc;

use flume::{Receiver, TryRecvError};
use log::{debug, error};

use super::progress_sync;
use crate::api::ComicsApi;
use crate::bookmark::Bookmark;
use crate::progress::ReadingProgress;

/// What the backend knows about this comic. `None` fields could not be
/// fetched; the failure is already logged.
#[derive(Debug, Default)]
pub struct ServerState {
    pub progress: Option<ReadingProgress>,
    pub bookmarks: Option<Vec<Bookmark>>,
}

pub struct PendingServerState {
    rx: Receiver<ServerState>,
}

impl PendingServerState {
    pub fn start(api: Arc<dyn ComicsApi>, slug: String) -> Self {
        let (tx, rx) = flume::bounded(1);

        let spawned = std::thread::Builder::new()
            .name("server-state".to_string())
            .spawn(move || {
                let state = fetch(api.as_ref(), &slug);
                // Receiver is gone if the session closed first
                let _ = tx.send(state);
            });
        if let Err(e) = spawned {
            error!("Failed to start server state fetch: {e}");
        }

        Self { rx }
    }

    /// `None` while the requests are in flight.
    pub fn poll(&self) -> Option<ServerState> {
        match self.rx.try_recv() {
            Ok(state) => Some(state),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(ServerState::default()),
        }
    }

    /// Block until both requests finish.
    pub fn wait(&self) -> ServerState {
        self.rx.recv().unwrap_or_default()
    }
}

pub fn fetch(api: &dyn ComicsApi, slug: &str) -> ServerState {
    let progress = progress_sync::fetch(api, slug);
    let bookmarks = match api.list_bookmarks(slug) {
        Ok(bookmarks) => {
            debug!("Fetched {} bookmarks for {slug}", bookmarks.len());
            Some(bookmarks)
        }
        Err(e) => {
            error!("Failed to load bookmarks for {slug}: {e}");
            None
        }
    };
    ServerState {
        progress,
        bookmarks,
    }
}
