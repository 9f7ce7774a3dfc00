//! In-memory stand-ins for the backend, the document loader and the terminal.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::Utc;
use ratatui::Terminal;
use ratatui::backend::TestBackend;

use crate::api::{ApiError, ApiResult, ComicsApi};
use crate::bookmark::Bookmark;
use crate::event_source::{Event, KeyCode, SimulatedEventSource};
use crate::library::LibraryEntry;
use crate::progress::{ProgressUpdate, ReadingProgress};
use crate::reader::document::{DocumentInfo, DocumentLoader, DocumentSource, LoadError};
use crate::reader::session::{ReaderConfig, ReaderServices, ReaderSession};
use crate::settings::{LocalStorage, SettingsStore};
use crate::system_command::MockSystemCommandExecutor;

#[derive(Default)]
struct MockState {
    bookmarks: Vec<Bookmark>,
    next_id: u64,
    progress: Option<ReadingProgress>,
    progress_updates: Vec<ProgressUpdate>,
    library: Vec<LibraryEntry>,
    fail: bool,
    failed_calls: usize,
}

/// A comics backend held in memory. Every call fails with a 503 while
/// `fail_requests(true)` is in effect.
#[derive(Default)]
pub struct MockComicsApi {
    state: Mutex<MockState>,
}

impl MockComicsApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start (or stop) failing every request.
    pub fn fail_requests(&self, fail: bool) {
        self.state().fail = fail;
    }

    pub fn seed_bookmark(&self, page: usize, note: Option<&str>) -> u64 {
        let mut state = self.state();
        let bookmark = new_bookmark(&mut state, page, note);
        let id = bookmark.id;
        state.bookmarks.push(bookmark);
        id
    }

    pub fn set_progress(&self, current_page: usize, total_pages: usize) {
        self.state().progress = Some(ReadingProgress::compute(current_page, total_pages, 0));
    }

    pub fn set_library(&self, entries: Vec<LibraryEntry>) {
        self.state().library = entries;
    }

    /// Bookmarks as the server sees them.
    pub fn bookmarks(&self) -> Vec<Bookmark> {
        self.state().bookmarks.clone()
    }

    /// Successful progress updates, oldest first.
    pub fn progress_updates(&self) -> Vec<ProgressUpdate> {
        self.state().progress_updates.clone()
    }

    pub fn failed_calls(&self) -> usize {
        self.state().failed_calls
    }

    fn check(&self) -> ApiResult<MutexGuard<'_, MockState>> {
        let mut state = self.state();
        if state.fail {
            state.failed_calls += 1;
            return Err(ApiError::status(503, "service unavailable"));
        }
        Ok(state)
    }
}

fn new_bookmark(state: &mut MockState, page: usize, note: Option<&str>) -> Bookmark {
    state.next_id += 1;
    let now = Utc::now();
    Bookmark {
        id: state.next_id,
        page,
        note: note.map(str::to_string),
        created_at: now,
        updated_at: now,
    }
}

impl ComicsApi for MockComicsApi {
    fn list_bookmarks(&self, _slug: &str) -> ApiResult<Vec<Bookmark>> {
        Ok(self.check()?.bookmarks.clone())
    }

    fn create_bookmark(&self, _slug: &str, page: usize, note: Option<&str>) -> ApiResult<Bookmark> {
        let mut state = self.check()?;
        let bookmark = new_bookmark(&mut state, page, note);
        state.bookmarks.push(bookmark.clone());
        Ok(bookmark)
    }

    fn update_bookmark(&self, _slug: &str, id: u64, note: Option<&str>) -> ApiResult<Bookmark> {
        let mut state = self.check()?;
        let bookmark = state
            .bookmarks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| ApiError::status(404, "bookmark not found"))?;
        bookmark.note = note.map(str::to_string);
        bookmark.updated_at = Utc::now();
        Ok(bookmark.clone())
    }

    fn delete_bookmark(&self, _slug: &str, id: u64) -> ApiResult<()> {
        let mut state = self.check()?;
        let before = state.bookmarks.len();
        state.bookmarks.retain(|b| b.id != id);
        if state.bookmarks.len() == before {
            return Err(ApiError::status(404, "bookmark not found"));
        }
        Ok(())
    }

    fn get_progress(&self, _slug: &str) -> ApiResult<ReadingProgress> {
        self.check()?
            .progress
            .clone()
            .ok_or_else(|| ApiError::status(404, "no progress recorded"))
    }

    fn update_progress(&self, _slug: &str, update: &ProgressUpdate) -> ApiResult<ReadingProgress> {
        let mut state = self.check()?;
        let progress = ReadingProgress::from(*update);
        state.progress_updates.push(*update);
        state.progress = Some(progress.clone());
        Ok(progress)
    }

    fn library(&self) -> ApiResult<Vec<LibraryEntry>> {
        Ok(self.check()?.library.clone())
    }
}

/// Loads instantly with a fixed page count, optionally failing the first
/// few attempts.
pub struct StaticDocumentLoader {
    page_count: usize,
    title: Option<String>,
    failures_left: AtomicUsize,
    error: LoadError,
    loads: AtomicUsize,
}

impl StaticDocumentLoader {
    pub fn new(page_count: usize) -> Self {
        Self {
            page_count,
            title: None,
            failures_left: AtomicUsize::new(0),
            error: LoadError::Empty,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Fail the next `times` loads with `error`.
    pub fn failing(mut self, times: usize, error: LoadError) -> Self {
        self.failures_left = AtomicUsize::new(times);
        self.error = error;
        self
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl DocumentLoader for StaticDocumentLoader {
    fn load(&self, _source: &DocumentSource) -> Result<DocumentInfo, LoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(self.error.clone());
        }
        Ok(DocumentInfo {
            page_count: self.page_count,
            title: self.title.clone(),
        })
    }
}

/// Everything a test needs to drive a session and inspect its collaborators.
pub struct TestReader {
    pub session: ReaderSession,
    pub api: Arc<MockComicsApi>,
    pub loader: Arc<StaticDocumentLoader>,
}

impl TestReader {
    /// Open a session over `pages` pages and wait for the load to finish.
    pub fn open(pages: usize) -> Self {
        Self::open_with(Arc::new(MockComicsApi::new()), StaticDocumentLoader::new(pages))
    }

    pub fn open_with(api: Arc<MockComicsApi>, loader: StaticDocumentLoader) -> Self {
        Self::open_with_store(api, loader, SettingsStore::new(LocalStorage::ephemeral()))
    }

    pub fn open_with_store(
        api: Arc<MockComicsApi>,
        loader: StaticDocumentLoader,
        settings_store: SettingsStore,
    ) -> Self {
        let loader = Arc::new(loader);
        let config = ReaderConfig::new("test-comic", DocumentSource::parse("/comics/test-comic.pdf"))
            .with_title("Test Comic")
            .with_sync_debounce(Duration::from_millis(10));
        let services = ReaderServices {
            api: api.clone(),
            loader: loader.clone(),
            settings_store,
            system_executor: Box::new(MockSystemCommandExecutor::new()),
        };
        let mut session = ReaderSession::open(config, services, Instant::now());
        session.wait_for_document();
        Self {
            session,
            api,
            loader,
        }
    }

    /// Close the session, flushing pending progress, and hand back the backend.
    pub fn close(self) -> Arc<MockComicsApi> {
        self.session.close();
        self.api
    }

    pub fn executed_commands(&self) -> Vec<String> {
        self.session
            .system_executor()
            .as_any()
            .downcast_ref::<MockSystemCommandExecutor>()
            .map(MockSystemCommandExecutor::get_executed_commands)
            .unwrap_or_default()
    }
}

/// Builder for creating test scenarios with simulated user input
#[derive(Default)]
pub struct TestScenarioBuilder {
    events: Vec<Event>,
}

impl TestScenarioBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press_char(mut self, c: char) -> Self {
        self.events.push(SimulatedEventSource::char_key(c));
        self
    }

    pub fn press_key(mut self, code: KeyCode) -> Self {
        self.events.push(SimulatedEventSource::key(code));
        self
    }

    pub fn press_ctrl_char(mut self, c: char) -> Self {
        self.events.push(SimulatedEventSource::ctrl_char_key(c));
        self
    }

    pub fn next_pages(mut self, times: usize) -> Self {
        for _ in 0..times {
            self.events.push(SimulatedEventSource::key(KeyCode::Right));
        }
        self
    }

    pub fn previous_pages(mut self, times: usize) -> Self {
        for _ in 0..times {
            self.events.push(SimulatedEventSource::key(KeyCode::Left));
        }
        self
    }

    pub fn press_escape(mut self) -> Self {
        self.events.push(SimulatedEventSource::key(KeyCode::Esc));
        self
    }

    pub fn quit(mut self) -> Self {
        self.events.push(SimulatedEventSource::char_key('q'));
        self
    }

    pub fn event(mut self, event: Event) -> Self {
        self.events.push(event);
        self
    }

    pub fn build(self) -> SimulatedEventSource {
        SimulatedEventSource::new(self.events)
    }
}

/// Create a test terminal for snapshot testing
pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
    let backend = TestBackend::new(width, height);
    Terminal::new(backend).unwrap()
}

/// Capture the current terminal buffer as a string
pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    let mut lines = Vec::new();

    for y in 0..buffer.area.height {
        let mut line = String::new();
        for x in 0..buffer.area.width {
            line.push_str(buffer[(x, y)].symbol());
        }
        lines.push(line.trim_end().to_string());
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}
