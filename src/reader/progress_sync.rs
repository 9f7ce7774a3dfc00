//! Progress synchronizer - pushes reading progress to the backend
//!
//! Updates are handed to a worker thread over a channel so page turns never
//! wait on the network. The worker debounces bursts (holding a page key down
//! produces many page changes) and only sends the most recent state.
//! Failures are logged and dropped: the next page change re-sends the full
//! state anyway.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use flume::{Receiver, RecvTimeoutError, Sender};
use log::{debug, error, warn};

use crate::api::ComicsApi;
use crate::progress::{ProgressUpdate, ReadingProgress};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

pub struct ProgressSync {
    tx: Option<Sender<ProgressUpdate>>,
    worker: Option<JoinHandle<()>>,
}

impl ProgressSync {
    pub fn spawn(api: Arc<dyn ComicsApi>, slug: impl Into<String>, debounce: Duration) -> Self {
        let slug = slug.into();
        let (tx, rx) = flume::unbounded();

        let worker = std::thread::Builder::new()
            .name("progress-sync".to_string())
            .spawn(move || sync_worker(api.as_ref(), &slug, &rx, debounce));

        match worker {
            Ok(handle) => Self {
                tx: Some(tx),
                worker: Some(handle),
            },
            Err(e) => {
                error!("Failed to start progress sync worker, progress will not be saved: {e}");
                Self::disabled()
            }
        }
    }

    /// A synchronizer that drops every update.
    pub fn disabled() -> Self {
        Self {
            tx: None,
            worker: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue an update. Never blocks.
    pub fn report(&self, update: ProgressUpdate) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send(update).is_err() {
            warn!("Progress sync worker is gone, dropping update for page {}", update.current_page);
        }
    }

    /// Send whatever is still queued and wait for the worker to finish.
    pub fn shutdown(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        // Closing the channel lets the worker flush and exit
        self.tx.take();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("Progress sync worker panicked");
            }
        }
    }
}

impl Drop for ProgressSync {
    fn drop(&mut self) {
        // Detach: an in-flight request finishes on its own
        self.tx.take();
    }
}

/// Progress the server last recorded for `slug`. `None` when the comic was
/// never opened (404) or the request failed.
pub fn fetch(api: &dyn ComicsApi, slug: &str) -> Option<ReadingProgress> {
    match api.get_progress(slug) {
        Ok(progress) => Some(progress),
        Err(e) if e.is_not_found() => {
            debug!("No saved progress for {slug}");
            None
        }
        Err(e) => {
            warn!("Failed to fetch progress for {slug}: {e}");
            None
        }
    }
}

fn sync_worker(
    api: &dyn ComicsApi,
    slug: &str,
    rx: &Receiver<ProgressUpdate>,
    debounce: Duration,
) {
    while let Ok(mut latest) = rx.recv() {
        loop {
            match rx.recv_timeout(debounce) {
                Ok(update) => latest = update,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        match api.update_progress(slug, &latest) {
            Ok(progress) => debug!(
                "Synced progress for {slug}: page {}/{} ({:.0}%)",
                progress.current_page, progress.total_pages, progress.progress_percentage
            ),
            Err(e) => warn!(
                "Failed to sync progress for {slug} (page {}): {e}",
                latest.current_page
            ),
        }
    }
    debug!("Progress sync worker for {slug} stopped");
}
