use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use comikrat::api::{ApiResult, ComicsApi};
use comikrat::bookmark::Bookmark;
use comikrat::library::LibraryEntry;
use comikrat::progress::{ProgressUpdate, ReadingProgress};
use comikrat::reader::document::LoadError;
use comikrat::reader::gesture::{TouchEvent, TouchPhase, TouchPoint};
use comikrat::reader::navigation::DEFAULT_ZOOM;
use comikrat::reader::{DocumentSource, DocumentState, KeyOutcome};
use comikrat::settings::{LocalStorage, SettingsStore};
use comikrat::system_command::MockSystemCommandExecutor;
use comikrat::test_utils::{MockComicsApi, StaticDocumentLoader, TestReader};
use comikrat::{ReaderConfig, ReaderServices, ReaderSession};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

fn press(reader: &mut TestReader, code: KeyCode) -> KeyOutcome {
    press_at(reader, code, Instant::now())
}

fn press_at(reader: &mut TestReader, code: KeyCode, now: Instant) -> KeyOutcome {
    reader
        .session
        .handle_key(&KeyEvent::new(code, KeyModifiers::empty()), now)
}

/// A backend that takes its time answering the reads made on open.
struct SlowApi {
    inner: MockComicsApi,
    delay: Duration,
}

impl ComicsApi for SlowApi {
    fn list_bookmarks(&self, slug: &str) -> ApiResult<Vec<Bookmark>> {
        thread::sleep(self.delay);
        self.inner.list_bookmarks(slug)
    }

    fn create_bookmark(&self, slug: &str, page: usize, note: Option<&str>) -> ApiResult<Bookmark> {
        self.inner.create_bookmark(slug, page, note)
    }

    fn update_bookmark(&self, slug: &str, id: u64, note: Option<&str>) -> ApiResult<Bookmark> {
        self.inner.update_bookmark(slug, id, note)
    }

    fn delete_bookmark(&self, slug: &str, id: u64) -> ApiResult<()> {
        self.inner.delete_bookmark(slug, id)
    }

    fn get_progress(&self, slug: &str) -> ApiResult<ReadingProgress> {
        thread::sleep(self.delay);
        self.inner.get_progress(slug)
    }

    fn update_progress(&self, slug: &str, update: &ProgressUpdate) -> ApiResult<ReadingProgress> {
        self.inner.update_progress(slug, update)
    }

    fn library(&self) -> ApiResult<Vec<LibraryEntry>> {
        self.inner.library()
    }
}

fn open_without_waiting(api: Arc<dyn ComicsApi>, pages: usize) -> ReaderSession {
    let config = ReaderConfig::new("slow-comic", DocumentSource::parse("/comics/slow-comic.pdf"))
        .with_sync_debounce(Duration::from_millis(10));
    let services = ReaderServices {
        api,
        loader: Arc::new(StaticDocumentLoader::new(pages)),
        settings_store: SettingsStore::new(LocalStorage::ephemeral()),
        system_executor: Box::new(MockSystemCommandExecutor::new()),
    };
    ReaderSession::open(config, services, Instant::now())
}

/// Tick until `done` holds, failing if any single tick stalls.
fn tick_until(session: &mut ReaderSession, done: impl Fn(&ReaderSession) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !done(&*session) {
        assert!(Instant::now() < deadline, "condition never reached");
        let started = Instant::now();
        session.tick(Instant::now());
        assert!(
            started.elapsed() < Duration::from_millis(200),
            "tick took {:?}",
            started.elapsed()
        );
        thread::sleep(Duration::from_millis(5));
    }
}

fn touch(phase: TouchPhase, points: &[(f32, f32)], at_ms: u64) -> TouchEvent {
    TouchEvent::new(
        phase,
        points.iter().map(|&(x, y)| TouchPoint::new(x, y)).collect(),
        Duration::from_millis(at_ms),
    )
}

fn double_tap(reader: &mut TestReader, start_ms: u64) {
    let p = [(200.0, 300.0)];
    reader.session.handle_touch(&touch(TouchPhase::Start, &p, start_ms));
    reader.session.handle_touch(&touch(TouchPhase::End, &p, start_ms + 50));
    reader.session.handle_touch(&touch(TouchPhase::Start, &p, start_ms + 100));
    reader.session.handle_touch(&touch(TouchPhase::End, &p, start_ms + 150));
}

#[test]
fn reading_to_the_end_completes_the_comic() {
    let mut reader = TestReader::open(10);
    assert_eq!(reader.session.current_page(), 1);

    for _ in 0..9 {
        reader.session.next_page();
    }

    assert_eq!(reader.session.current_page(), 10);
    let progress = reader.session.progress();
    assert_eq!(progress.progress_percentage, 100.0);
    assert!(progress.is_completed);

    let api = reader.close();
    let last = *api.progress_updates().last().expect("progress was synced");
    assert_eq!(last.current_page, 10);
    assert_eq!(last.total_pages, 10);
}

#[test]
fn out_of_range_pages_are_clamped() {
    let mut reader = TestReader::open(10);
    reader.session.go_to_page(99);
    assert_eq!(reader.session.current_page(), 10);
    reader.session.go_to_page(0);
    assert_eq!(reader.session.current_page(), 1);
    reader.session.previous_page();
    assert_eq!(reader.session.current_page(), 1);
}

#[test]
fn pinch_scales_zoom_by_finger_distance() {
    let mut reader = TestReader::open(5);
    assert_eq!(reader.session.zoom(), DEFAULT_ZOOM);

    reader
        .session
        .handle_touch(&touch(TouchPhase::Start, &[(0.0, 0.0), (100.0, 0.0)], 0));
    reader
        .session
        .handle_touch(&touch(TouchPhase::Move, &[(0.0, 0.0), (200.0, 0.0)], 40));

    assert!((reader.session.zoom() - 2.4).abs() < 1e-4);
}

#[test]
fn double_tap_toggles_zoom_and_recenters() {
    let mut reader = TestReader::open(5);

    double_tap(&mut reader, 0);
    assert_eq!(reader.session.zoom(), 2.0);

    // Drag to pan while zoomed in
    reader.session.handle_touch(&touch(TouchPhase::Start, &[(100.0, 100.0)], 1_000));
    reader.session.handle_touch(&touch(TouchPhase::Move, &[(140.0, 90.0)], 1_050));
    assert_eq!(reader.session.pan(), (40.0, -10.0));
    reader.session.handle_touch(&touch(TouchPhase::End, &[(140.0, 90.0)], 1_500));

    double_tap(&mut reader, 2_000);
    assert_eq!(reader.session.zoom(), DEFAULT_ZOOM);
    assert_eq!(reader.session.pan(), (0.0, 0.0));
}

#[test]
fn horizontal_swipes_turn_pages() {
    let mut reader = TestReader::open(5);

    reader.session.handle_touch(&touch(TouchPhase::Start, &[(300.0, 100.0)], 0));
    reader.session.handle_touch(&touch(TouchPhase::End, &[(100.0, 110.0)], 200));
    assert_eq!(reader.session.current_page(), 2);

    reader.session.handle_touch(&touch(TouchPhase::Start, &[(100.0, 100.0)], 1_000));
    reader.session.handle_touch(&touch(TouchPhase::End, &[(300.0, 100.0)], 1_200));
    assert_eq!(reader.session.current_page(), 1);
}

#[test]
fn disabled_gestures_are_ignored() {
    let mut reader = TestReader::open(5);
    reader.session.update_settings(|s| s.swipe_navigation = false);

    reader.session.handle_touch(&touch(TouchPhase::Start, &[(300.0, 100.0)], 0));
    reader.session.handle_touch(&touch(TouchPhase::End, &[(100.0, 100.0)], 200));
    assert_eq!(reader.session.current_page(), 1);

    reader.session.update_settings(|s| s.gestures_enabled = false);
    double_tap(&mut reader, 1_000);
    assert_eq!(reader.session.zoom(), DEFAULT_ZOOM);
}

#[test]
fn bookmark_key_adds_then_removes() {
    let mut reader = TestReader::open(10);
    reader.session.go_to_page(4);

    press(&mut reader, KeyCode::Char('b'));
    assert!(reader.session.bookmarks().is_bookmarked(4));
    assert_eq!(reader.api.bookmarks().len(), 1);

    press(&mut reader, KeyCode::Char('b'));
    assert!(!reader.session.bookmarks().is_bookmarked(4));
    assert!(reader.api.bookmarks().is_empty());
}

#[test]
fn bookmark_network_failure_changes_nothing() {
    let mut reader = TestReader::open(10);
    reader.api.fail_requests(true);

    press(&mut reader, KeyCode::Char('b'));

    assert!(!reader.session.bookmarks().is_bookmarked(1));
    assert_eq!(reader.session.current_page(), 1);
    assert!(reader.api.failed_calls() >= 1);
}

#[test]
fn existing_bookmarks_load_with_the_document() {
    let api = Arc::new(MockComicsApi::new());
    api.seed_bookmark(3, Some("first appearance"));
    api.seed_bookmark(8, None);
    let reader = TestReader::open_with(api, StaticDocumentLoader::new(10));

    assert_eq!(reader.session.bookmarks().len(), 2);
    assert!(reader.session.bookmarks().is_bookmarked(8));
}

#[test]
fn bookmark_panel_jumps_and_deletes() {
    let api = Arc::new(MockComicsApi::new());
    api.seed_bookmark(7, None);
    api.seed_bookmark(3, None);
    let mut reader = TestReader::open_with(api, StaticDocumentLoader::new(10));

    press(&mut reader, KeyCode::Char('m'));
    assert!(reader.session.bookmark_panel().is_some());
    // Sorted by page: 3, 7
    press(&mut reader, KeyCode::Down);
    press(&mut reader, KeyCode::Enter);
    assert_eq!(reader.session.current_page(), 7);
    assert!(reader.session.bookmark_panel().is_none());

    press(&mut reader, KeyCode::Char('m'));
    press(&mut reader, KeyCode::Char('d'));
    assert_eq!(reader.session.bookmarks().len(), 1);
    assert!(reader.session.bookmarks().is_bookmarked(7));
    assert_eq!(reader.api.bookmarks().len(), 1);
}

#[test]
fn unbookmarking_with_the_panel_open_keeps_a_valid_selection() {
    let api = Arc::new(MockComicsApi::new());
    api.seed_bookmark(3, None);
    api.seed_bookmark(7, None);
    let mut reader = TestReader::open_with(api, StaticDocumentLoader::new(10));
    reader.session.go_to_page(7);

    press(&mut reader, KeyCode::Char('m'));
    press(&mut reader, KeyCode::Down);
    assert_eq!(reader.session.bookmark_panel().map(|p| p.selected()), Some(1));

    press(&mut reader, KeyCode::Char('b'));
    assert!(!reader.session.bookmarks().is_bookmarked(7));
    assert_eq!(reader.session.bookmark_panel().map(|p| p.selected()), Some(0));

    press(&mut reader, KeyCode::Enter);
    assert_eq!(reader.session.current_page(), 3);
}

#[test]
fn slow_backend_never_stalls_the_tick() {
    let inner = MockComicsApi::new();
    inner.set_progress(3, 5);
    inner.seed_bookmark(2, None);
    let api = Arc::new(SlowApi {
        inner,
        delay: Duration::from_millis(700),
    });
    let mut session = open_without_waiting(api, 5);

    tick_until(&mut session, |s| s.document().is_ready());
    assert_eq!(session.total_pages(), 5);
    tick_until(&mut session, |s| s.bookmarks().len() == 1);

    assert_eq!(session.current_page(), 3);
    assert!(session.bookmarks().is_bookmarked(2));
    session.close();
}

#[test]
fn page_turned_before_resume_is_kept() {
    let inner = MockComicsApi::new();
    inner.set_progress(4, 6);
    inner.seed_bookmark(5, None);
    let api = Arc::new(SlowApi {
        inner,
        delay: Duration::from_millis(300),
    });
    let mut session = open_without_waiting(api, 6);

    tick_until(&mut session, |s| s.document().is_ready());
    session.next_page();
    tick_until(&mut session, |s| s.bookmarks().len() == 1);

    assert_eq!(session.current_page(), 2);
    session.close();
}

#[test]
fn saved_progress_resumes_without_resyncing() {
    let api = Arc::new(MockComicsApi::new());
    api.set_progress(6, 12);
    let reader = TestReader::open_with(api, StaticDocumentLoader::new(12));

    assert_eq!(reader.session.current_page(), 6);
    let api = reader.close();
    assert!(api.progress_updates().is_empty());
}

#[test]
fn escape_closes_overlays_in_order() {
    let mut reader = TestReader::open(5);
    press(&mut reader, KeyCode::Char('s'));
    press(&mut reader, KeyCode::Char('m'));
    assert!(reader.session.settings_panel().is_some());
    assert!(reader.session.bookmark_panel().is_some());

    assert_eq!(press(&mut reader, KeyCode::Esc), KeyOutcome::Handled);
    assert!(reader.session.bookmark_panel().is_none());
    assert!(reader.session.settings_panel().is_some());

    assert_eq!(press(&mut reader, KeyCode::Esc), KeyOutcome::Handled);
    assert!(reader.session.settings_panel().is_none());

    assert_eq!(press(&mut reader, KeyCode::Esc), KeyOutcome::Quit);
    assert!(reader.session.should_quit());
}

#[test]
fn keyboard_shortcuts_can_be_switched_off() {
    let mut reader = TestReader::open(5);
    reader.session.update_settings(|s| s.keyboard_shortcuts = false);

    assert_eq!(press(&mut reader, KeyCode::Right), KeyOutcome::Ignored);
    assert_eq!(reader.session.current_page(), 1);

    // The settings panel stays reachable to turn them back on
    assert_eq!(press(&mut reader, KeyCode::Char('s')), KeyOutcome::Handled);
    assert!(reader.session.settings_panel().is_some());
}

#[test]
fn zoom_rotate_and_fullscreen_keys() {
    let mut reader = TestReader::open(5);
    press(&mut reader, KeyCode::Char('+'));
    assert!((reader.session.zoom() - (DEFAULT_ZOOM + 0.25)).abs() < 1e-4);
    press(&mut reader, KeyCode::Char('-'));
    press(&mut reader, KeyCode::Char('-'));
    assert!((reader.session.zoom() - (DEFAULT_ZOOM - 0.25)).abs() < 1e-4);
    press(&mut reader, KeyCode::Char('0'));
    assert_eq!(reader.session.zoom(), DEFAULT_ZOOM);

    press(&mut reader, KeyCode::Char('r'));
    assert_eq!(reader.session.rotation().degrees(), 90);

    press(&mut reader, KeyCode::F(11));
    assert!(reader.session.is_fullscreen());
    press(&mut reader, KeyCode::Char('f'));
    assert!(!reader.session.is_fullscreen());

    press(&mut reader, KeyCode::End);
    assert_eq!(reader.session.current_page(), 5);
    press(&mut reader, KeyCode::Home);
    assert_eq!(reader.session.current_page(), 1);
}

#[test]
fn failed_load_can_be_retried() {
    let loader = StaticDocumentLoader::new(8).failing(1, LoadError::Fetch("connection reset".into()));
    let mut reader = TestReader::open_with(Arc::new(MockComicsApi::new()), loader);

    assert!(matches!(reader.session.document(), DocumentState::Failed(LoadError::Fetch(_))));
    // Nothing to navigate before a document is loaded
    press(&mut reader, KeyCode::Right);
    assert_eq!(reader.session.current_page(), 1);

    assert_eq!(press(&mut reader, KeyCode::Char('R')), KeyOutcome::Handled);
    reader.session.wait_for_document();

    assert!(reader.session.document().is_ready());
    assert_eq!(reader.session.total_pages(), 8);
    assert_eq!(reader.loader.loads(), 2);
}

#[test]
fn fallback_opens_the_system_viewer() {
    let loader = StaticDocumentLoader::new(8).failing(1, LoadError::Parse("bad xref".into()));
    let mut reader = TestReader::open_with(Arc::new(MockComicsApi::new()), loader);

    assert_eq!(press(&mut reader, KeyCode::Char('o')), KeyOutcome::Handled);
    assert_eq!(reader.executed_commands(), vec!["/comics/test-comic.pdf".to_string()]);
}

#[test]
fn fallback_is_only_offered_after_a_failure() {
    let mut reader = TestReader::open(3);
    assert_eq!(press(&mut reader, KeyCode::Char('o')), KeyOutcome::Ignored);
    assert_eq!(press(&mut reader, KeyCode::Char('R')), KeyOutcome::Ignored);
    assert!(reader.executed_commands().is_empty());
}

#[test]
fn auto_advance_turns_pages_and_stops_at_the_end() {
    let mut reader = TestReader::open(3);
    let t0 = Instant::now();
    reader.session.update_settings(|s| {
        s.auto_advance = true;
        s.auto_advance_delay_secs = 1;
    });
    assert!(reader.session.is_auto_advancing());

    reader.session.tick(t0 + Duration::from_secs(2));
    assert_eq!(reader.session.current_page(), 2);
    reader.session.tick(t0 + Duration::from_secs(4));
    assert_eq!(reader.session.current_page(), 3);
    reader.session.tick(t0 + Duration::from_secs(6));
    assert_eq!(reader.session.current_page(), 3);
    assert!(!reader.session.is_auto_advancing());
    assert!(!reader.session.settings().auto_advance);
}

#[test]
fn auto_advance_restarts_after_reaching_the_end() {
    let mut reader = TestReader::open(3);
    let t0 = Instant::now();
    reader.session.update_settings(|s| {
        s.auto_advance = true;
        s.auto_advance_delay_secs = 1;
    });
    reader.session.tick(t0 + Duration::from_secs(2));
    reader.session.tick(t0 + Duration::from_secs(4));
    reader.session.tick(t0 + Duration::from_secs(6));
    assert!(!reader.session.is_auto_advancing());

    press_at(&mut reader, KeyCode::Home, t0 + Duration::from_secs(7));
    assert_eq!(
        press_at(&mut reader, KeyCode::Char('a'), t0 + Duration::from_secs(7)),
        KeyOutcome::Handled
    );
    assert!(reader.session.is_auto_advancing());
    assert!(reader.session.settings().auto_advance);

    reader.session.tick(t0 + Duration::from_secs(9));
    assert_eq!(reader.session.current_page(), 2);
}

#[test]
fn page_turn_postpones_auto_advance() {
    let mut reader = TestReader::open(5);
    let t0 = Instant::now();
    reader.session.update_settings(|s| {
        s.auto_advance = true;
        s.auto_advance_delay_secs = 2;
    });

    press_at(&mut reader, KeyCode::Right, t0 + Duration::from_secs(1));
    assert_eq!(reader.session.current_page(), 2);
    // Due two seconds after the manual turn, not after the start
    reader.session.tick(t0 + Duration::from_millis(2_500));
    assert_eq!(reader.session.current_page(), 2);
    reader.session.tick(t0 + Duration::from_secs(3));
    assert_eq!(reader.session.current_page(), 3);
}

#[test]
fn auto_advance_key_toggles_timer() {
    let mut reader = TestReader::open(3);
    press(&mut reader, KeyCode::Char('a'));
    assert!(reader.session.is_auto_advancing());
    assert!(reader.session.settings().auto_advance);
    press(&mut reader, KeyCode::Char('a'));
    assert!(!reader.session.is_auto_advancing());
}

#[test]
fn page_change_subscribers_see_every_commit() {
    let mut reader = TestReader::open(5);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let subscription = reader
        .session
        .on_page_change(move |change| sink.borrow_mut().push((change.from, change.to)));

    reader.session.next_page();
    reader.session.go_to_page(4);
    reader.session.go_to_page(4);
    assert_eq!(*seen.borrow(), vec![(1, 2), (2, 4)]);

    drop(subscription);
    reader.session.next_page();
    assert_eq!(seen.borrow().len(), 2);
}

#[test]
fn settings_panel_changes_are_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let store = SettingsStore::new(LocalStorage::open(&path));
    let mut reader =
        TestReader::open_with_store(Arc::new(MockComicsApi::new()), StaticDocumentLoader::new(4), store);

    press(&mut reader, KeyCode::Char('s'));
    // Theme, Fit mode, Touch gestures
    press(&mut reader, KeyCode::Down);
    press(&mut reader, KeyCode::Down);
    press(&mut reader, KeyCode::Enter);
    assert!(!reader.session.settings().gestures_enabled);

    let mut reopened = SettingsStore::new(LocalStorage::open(&path));
    assert!(!reopened.load().gestures_enabled);

    press(&mut reader, KeyCode::Char('x'));
    assert!(reader.session.settings().gestures_enabled);
    let mut reopened = SettingsStore::new(LocalStorage::open(&path));
    assert!(reopened.load().gestures_enabled);
}
