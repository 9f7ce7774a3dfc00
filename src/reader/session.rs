//! Reader shell state
//!
//! [`ReaderSession`] composes navigation, gestures, bookmarks, progress sync
//! and settings for one open comic and owns every piece of top-level UI
//! state (overlays, fullscreen, auto-advance, load status). Input arrives
//! as messages (`handle_key`, `handle_touch`, `tick`); the UI layer only
//! reads the session to draw it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};
use log::{debug, info, warn};

use super::auto_advance::AutoAdvance;
use super::document::{DocumentInfo, DocumentLoader, DocumentSource, DocumentState, LoadError, PendingLoad};
use super::gesture::{GestureIntent, GestureInterpreter, SwipeDirection, TouchEvent, ViewSnapshot};
use super::keymap::{self, ReaderAction};
use super::navigation::{Command, Effect, NavigationState, Rotation};
use super::panels::{BookmarkPanel, SettingsPanel};
use super::progress_sync::{DEFAULT_DEBOUNCE, ProgressSync};
use super::server_state::{PendingServerState, ServerState};
use crate::api::{ApiResult, ComicsApi};
use crate::bookmark::BookmarkClient;
use crate::events::{EventBus, PageChange, Subscription};
use crate::notification::NotificationManager;
use crate::progress::{ProgressUpdate, ReadingProgress};
use crate::settings::{ReaderSettings, SettingsStore};
use crate::system_command::SystemCommandExecutor;

#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub slug: String,
    pub title: Option<String>,
    pub source: DocumentSource,
    pub sync_debounce: Duration,
}

impl ReaderConfig {
    pub fn new(slug: impl Into<String>, source: DocumentSource) -> Self {
        Self {
            slug: slug.into(),
            title: None,
            source,
            sync_debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_sync_debounce(mut self, debounce: Duration) -> Self {
        self.sync_debounce = debounce;
        self
    }
}

/// Collaborators a session talks to.
pub struct ReaderServices {
    pub api: Arc<dyn ComicsApi>,
    pub loader: Arc<dyn DocumentLoader>,
    pub settings_store: SettingsStore,
    pub system_executor: Box<dyn SystemCommandExecutor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Ignored,
    Quit,
}

pub struct ReaderSession {
    slug: String,
    title: String,
    source: DocumentSource,
    api: Arc<dyn ComicsApi>,
    loader: Arc<dyn DocumentLoader>,
    nav: NavigationState,
    gestures: GestureInterpreter,
    bookmarks: BookmarkClient,
    progress_sync: ProgressSync,
    settings: ReaderSettings,
    settings_store: SettingsStore,
    document: DocumentState,
    server_state: Option<PendingServerState>,
    bookmark_panel: Option<BookmarkPanel>,
    settings_panel: Option<SettingsPanel>,
    fullscreen: bool,
    auto_advance: Option<AutoAdvance>,
    page_events: EventBus<PageChange>,
    notifications: NotificationManager,
    system_executor: Box<dyn SystemCommandExecutor>,
    started_at: Instant,
    should_quit: bool,
}

impl ReaderSession {
    /// Restore settings, start the progress worker and kick off the document load.
    pub fn open(config: ReaderConfig, services: ReaderServices, now: Instant) -> Self {
        let ReaderServices {
            api,
            loader,
            mut settings_store,
            system_executor,
        } = services;

        let settings = settings_store.load();
        let title = config.title.clone().unwrap_or_else(|| config.slug.clone());
        let progress_sync = ProgressSync::spawn(api.clone(), config.slug.clone(), config.sync_debounce);
        let document = DocumentState::Loading(PendingLoad::start(
            loader.clone(),
            config.source.clone(),
            Duration::from_secs(settings.load_timeout_secs),
            now,
        ));

        info!("Opened reader for {}", config.slug);

        Self {
            bookmarks: BookmarkClient::new(api.clone(), config.slug.clone()),
            slug: config.slug,
            title,
            source: config.source,
            api,
            loader,
            nav: NavigationState::new(),
            gestures: GestureInterpreter::new(),
            progress_sync,
            settings,
            settings_store,
            document,
            server_state: None,
            bookmark_panel: None,
            settings_panel: None,
            fullscreen: false,
            auto_advance: None,
            page_events: EventBus::new(),
            notifications: NotificationManager::new(),
            system_executor,
            started_at: now,
            should_quit: false,
        }
    }

    // --- accessors -------------------------------------------------------

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn source(&self) -> &DocumentSource {
        &self.source
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.nav
    }

    pub fn current_page(&self) -> usize {
        self.nav.current_page()
    }

    pub fn total_pages(&self) -> usize {
        self.nav.total_pages()
    }

    pub fn zoom(&self) -> f32 {
        self.nav.zoom()
    }

    pub fn rotation(&self) -> Rotation {
        self.nav.rotation()
    }

    pub fn pan(&self) -> (f32, f32) {
        self.nav.pan()
    }

    pub fn settings(&self) -> &ReaderSettings {
        &self.settings
    }

    pub fn document(&self) -> &DocumentState {
        &self.document
    }

    pub fn bookmarks(&self) -> &BookmarkClient {
        &self.bookmarks
    }

    pub fn bookmark_panel(&self) -> Option<&BookmarkPanel> {
        self.bookmark_panel.as_ref()
    }

    pub fn settings_panel(&self) -> Option<&SettingsPanel> {
        self.settings_panel.as_ref()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn is_auto_advancing(&self) -> bool {
        self.auto_advance.is_some()
    }

    pub fn notifications(&self) -> &NotificationManager {
        &self.notifications
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Progress as of now, including reading time so far.
    pub fn progress(&self) -> ReadingProgress {
        self.progress_at(Instant::now())
    }

    pub fn progress_at(&self, now: Instant) -> ReadingProgress {
        ProgressUpdate::new(
            self.nav.current_page(),
            self.nav.total_pages(),
            now.saturating_duration_since(self.started_at),
        )
        .into()
    }

    /// Register a page-change callback; it stays registered until the
    /// returned subscription is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn on_page_change(&self, callback: impl FnMut(&PageChange) + 'static) -> Subscription<PageChange> {
        self.page_events.subscribe(callback)
    }

    // --- document lifecycle ---------------------------------------------

    /// Advance timers and pick up a finished document load.
    pub fn tick(&mut self, now: Instant) {
        if let DocumentState::Loading(pending) = &self.document {
            if let Some(result) = pending.poll(now) {
                self.finish_load(result, now);
            }
        }

        if let Some(state) = self.server_state.as_ref().and_then(PendingServerState::poll) {
            self.server_state = None;
            self.apply_server_state(state);
        }

        let fire = self
            .auto_advance
            .as_mut()
            .is_some_and(|timer| timer.poll(now));
        if fire && self.document.is_ready() {
            if self.nav.is_last_page() {
                self.finish_auto_advance();
            } else {
                let _ = self.dispatch(Command::NextPage, now);
            }
        }

        self.notifications.update(now);
    }

    /// Block until the pending load resolves (or times out), then until the
    /// server state for it has arrived.
    pub fn wait_for_document(&mut self) {
        if let DocumentState::Loading(pending) = &self.document {
            let result = pending.wait();
            self.finish_load(result, Instant::now());
        }
        if let Some(pending) = self.server_state.take() {
            let state = pending.wait();
            self.apply_server_state(state);
        }
    }

    fn finish_load(&mut self, result: Result<DocumentInfo, LoadError>, now: Instant) {
        match result {
            Ok(info) => {
                info!("Loaded {} ({} pages)", self.source, info.page_count);
                if let Some(title) = &info.title {
                    self.title = title.clone();
                }
                let _ = self.nav.apply(Command::SetTotalPages(info.page_count));
                self.document = DocumentState::Ready(info);
                self.server_state = Some(PendingServerState::start(
                    self.api.clone(),
                    self.slug.clone(),
                ));
                if self.settings.auto_advance {
                    self.start_auto_advance(now);
                }
            }
            Err(e) => {
                warn!("Failed to load {}: {e}", self.source);
                self.document = DocumentState::Failed(e);
            }
        }
    }

    /// Take the fetched bookmarks and jump to the last page the server saw,
    /// without reporting it back. A page turned while the fetch was in
    /// flight wins over the saved page.
    fn apply_server_state(&mut self, state: ServerState) {
        if let Some(bookmarks) = state.bookmarks {
            self.bookmarks.replace(bookmarks);
            if let Some(panel) = self.bookmark_panel.as_mut() {
                panel.clamp(self.bookmarks.len());
            }
        }
        let Some(progress) = state.progress else {
            return;
        };
        if progress.current_page > 1 && self.nav.current_page() == 1 {
            debug!("Resuming {} at page {}", self.slug, progress.current_page);
            let _ = self.nav.apply(Command::GoToPage(progress.current_page));
        }
    }

    /// Restart a failed load.
    pub fn retry_load(&mut self, now: Instant) -> bool {
        if !matches!(self.document, DocumentState::Failed(_)) {
            return false;
        }
        info!("Retrying load of {}", self.source);
        self.document = DocumentState::Loading(PendingLoad::start(
            self.loader.clone(),
            self.source.clone(),
            Duration::from_secs(self.settings.load_timeout_secs),
            now,
        ));
        true
    }

    /// Fallback rendering mode: hand the document to the system viewer.
    pub fn open_fallback(&mut self) -> bool {
        match self.system_executor.open_external(&self.source.location()) {
            Ok(()) => {
                self.notifications.info("Opened in external viewer");
                true
            }
            Err(e) => {
                self.notifications.error(format!("Could not open viewer: {e}"));
                false
            }
        }
    }

    pub fn system_executor(&self) -> &dyn SystemCommandExecutor {
        self.system_executor.as_ref()
    }

    // --- navigation -------------------------------------------------------

    /// Run a navigation command and carry out its side effects.
    pub fn dispatch(&mut self, cmd: Command, now: Instant) -> Vec<Effect> {
        let effects = self.nav.apply(cmd);
        for effect in &effects {
            if let Effect::PageChanged { from, to } = *effect {
                self.on_page_committed(from, to, now);
            }
        }
        effects
    }

    fn on_page_committed(&mut self, from: usize, to: usize, now: Instant) {
        let total = self.nav.total_pages();
        self.gestures.reset();
        self.progress_sync.report(ProgressUpdate::new(
            to,
            total,
            now.saturating_duration_since(self.started_at),
        ));
        self.page_events.publish(&PageChange {
            from,
            to,
            total_pages: total,
        });
        if let Some(timer) = self.auto_advance.as_mut() {
            timer.restart(now);
        }
    }

    pub fn go_to_page(&mut self, page: usize) {
        let _ = self.dispatch(Command::GoToPage(page), Instant::now());
    }

    pub fn next_page(&mut self) {
        let _ = self.dispatch(Command::NextPage, Instant::now());
    }

    pub fn previous_page(&mut self) {
        let _ = self.dispatch(Command::PreviousPage, Instant::now());
    }

    pub fn first_page(&mut self) {
        let _ = self.dispatch(Command::FirstPage, Instant::now());
    }

    pub fn last_page(&mut self) {
        let _ = self.dispatch(Command::LastPage, Instant::now());
    }

    pub fn zoom_in(&mut self) {
        let _ = self.dispatch(Command::ZoomIn, Instant::now());
    }

    pub fn zoom_out(&mut self) {
        let _ = self.dispatch(Command::ZoomOut, Instant::now());
    }

    pub fn rotate(&mut self) {
        let _ = self.dispatch(Command::Rotate, Instant::now());
    }

    pub fn reset_view(&mut self) {
        let _ = self.dispatch(Command::ResetView, Instant::now());
    }

    // --- touch ------------------------------------------------------------

    pub fn handle_touch(&mut self, event: &TouchEvent) -> Option<GestureIntent> {
        if !self.settings.gestures_enabled || !self.document.is_ready() {
            return None;
        }
        let view = ViewSnapshot {
            zoom: self.nav.zoom(),
            pan: self.nav.pan(),
        };
        let intent = self.gestures.handle(event, view)?;

        let cmd = match intent {
            GestureIntent::ToggleZoom if self.settings.double_tap_zoom => Command::ToggleZoom,
            GestureIntent::Pan { x, y } => Command::PanTo { x, y },
            GestureIntent::Swipe(SwipeDirection::Left) if self.settings.swipe_navigation => {
                Command::NextPage
            }
            GestureIntent::Swipe(SwipeDirection::Right) if self.settings.swipe_navigation => {
                Command::PreviousPage
            }
            GestureIntent::Pinch { zoom } if self.settings.pinch_zoom => Command::SetZoom(zoom),
            _ => return None,
        };
        let _ = self.dispatch(cmd, Instant::now());
        Some(intent)
    }

    // --- bookmarks ----------------------------------------------------------

    /// Bookmark the current page, or remove its bookmark.
    pub fn toggle_bookmark(&mut self) {
        if !self.document.is_ready() {
            return;
        }
        let page = self.nav.current_page();
        match self.bookmarks.toggle(page) {
            Ok(true) => self.notifications.info(format!("Bookmarked page {page}")),
            Ok(false) => {
                if let Some(panel) = self.bookmark_panel.as_mut() {
                    panel.clamp(self.bookmarks.len());
                }
                self.notifications
                    .info(format!("Removed bookmark on page {page}"));
            }
            // Already logged; network failures are not surfaced
            Err(_) => {}
        }
    }

    pub fn remove_bookmark(&mut self, id: u64) -> ApiResult<()> {
        let result = self.bookmarks.remove(id);
        if let Some(panel) = self.bookmark_panel.as_mut() {
            panel.clamp(self.bookmarks.len());
        }
        result
    }

    // --- overlays -----------------------------------------------------------

    pub fn toggle_bookmark_panel(&mut self) {
        self.bookmark_panel = match self.bookmark_panel {
            Some(_) => None,
            None => Some(BookmarkPanel::new()),
        };
    }

    pub fn toggle_settings_panel(&mut self) {
        self.settings_panel = match self.settings_panel {
            Some(_) => None,
            None => Some(SettingsPanel::new()),
        };
    }

    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen = !self.fullscreen;
    }

    /// Close the top-most overlay: bookmark panel, then settings panel,
    /// then the reader itself.
    pub fn escape(&mut self) -> KeyOutcome {
        if self.bookmark_panel.take().is_some() {
            KeyOutcome::Handled
        } else if self.settings_panel.take().is_some() {
            KeyOutcome::Handled
        } else {
            self.should_quit = true;
            KeyOutcome::Quit
        }
    }

    // --- settings ------------------------------------------------------------

    /// Change settings and persist them.
    pub fn update_settings(&mut self, change: impl FnOnce(&mut ReaderSettings)) {
        let before = self.settings.clone();
        change(&mut self.settings);
        self.settings = std::mem::take(&mut self.settings).sanitized();
        if self.settings == before {
            return;
        }
        self.persist_settings();
        self.reconcile_auto_advance(&before);
    }

    pub fn reset_settings(&mut self) {
        let before = self.settings.clone();
        match self.settings_store.reset() {
            Ok(defaults) => self.settings = defaults,
            Err(e) => {
                warn!("Failed to persist default settings: {e}");
                self.settings = ReaderSettings::default();
            }
        }
        self.notifications.info("Settings restored to defaults");
        self.reconcile_auto_advance(&before);
    }

    fn persist_settings(&mut self) {
        if let Err(e) = self.settings_store.save(&self.settings) {
            warn!("Failed to save reader settings: {e}");
            self.notifications.warn("Settings could not be saved");
        }
    }

    fn reconcile_auto_advance(&mut self, before: &ReaderSettings) {
        let delay_changed = before.auto_advance_delay_secs != self.settings.auto_advance_delay_secs;
        match (self.settings.auto_advance, self.auto_advance.is_some()) {
            (true, false) => self.start_auto_advance(Instant::now()),
            (true, true) if delay_changed => self.start_auto_advance(Instant::now()),
            (false, true) => self.stop_auto_advance(),
            _ => {}
        }
    }

    // --- auto-advance ---------------------------------------------------------

    /// Start or stop the page-turn timer, keeping the stored preference in step.
    pub fn toggle_auto_advance(&mut self, now: Instant) {
        // No timer runs before the document is ready; follow the preference then
        let enable = if self.document.is_ready() {
            self.auto_advance.is_none()
        } else {
            !self.settings.auto_advance
        };
        if self.settings.auto_advance != enable {
            self.settings.auto_advance = enable;
            self.persist_settings();
        }

        if !enable {
            self.stop_auto_advance();
            self.notifications.info("Auto-advance off");
        } else {
            self.start_auto_advance(now);
            if self.auto_advance.is_some() {
                self.notifications.info(format!(
                    "Auto-advance every {}s",
                    self.settings.auto_advance_delay_secs
                ));
            } else {
                self.notifications.info("Auto-advance starts once the comic loads");
            }
        }
    }

    /// The last page was reached: switch auto-advance off entirely, so the
    /// settings never claim a timer that is not running.
    fn finish_auto_advance(&mut self) {
        self.stop_auto_advance();
        self.settings.auto_advance = false;
        self.persist_settings();
        self.notifications.info("Reached the last page");
    }

    fn start_auto_advance(&mut self, now: Instant) {
        if !self.document.is_ready() {
            return;
        }
        let interval = Duration::from_secs(self.settings.auto_advance_delay_secs);
        debug!("Auto-advance every {interval:?}");
        self.auto_advance = Some(AutoAdvance::start(interval, now));
    }

    fn stop_auto_advance(&mut self) {
        if self.auto_advance.take().is_some() {
            debug!("Auto-advance stopped");
        }
    }

    // --- keyboard ---------------------------------------------------------------

    pub fn handle_key(&mut self, key: &KeyEvent, now: Instant) -> KeyOutcome {
        if !keymap::is_press(key) {
            return KeyOutcome::Ignored;
        }
        if self.bookmark_panel.is_some() {
            if let Some(outcome) = self.handle_bookmark_panel_key(key, now) {
                return outcome;
            }
        } else if self.settings_panel.is_some() {
            if let Some(outcome) = self.handle_settings_panel_key(key) {
                return outcome;
            }
        }

        let Some(action) = keymap::reader_action(key) else {
            return KeyOutcome::Ignored;
        };
        if !self.settings.keyboard_shortcuts && !action.always_available() {
            return KeyOutcome::Ignored;
        }
        self.perform(action, now)
    }

    pub fn perform(&mut self, action: ReaderAction, now: Instant) -> KeyOutcome {
        match action {
            ReaderAction::PreviousPage => {
                let _ = self.dispatch(Command::PreviousPage, now);
            }
            ReaderAction::NextPage => {
                let _ = self.dispatch(Command::NextPage, now);
            }
            ReaderAction::FirstPage => {
                let _ = self.dispatch(Command::FirstPage, now);
            }
            ReaderAction::LastPage => {
                let _ = self.dispatch(Command::LastPage, now);
            }
            ReaderAction::ZoomIn => {
                let _ = self.dispatch(Command::ZoomIn, now);
            }
            ReaderAction::ZoomOut => {
                let _ = self.dispatch(Command::ZoomOut, now);
            }
            ReaderAction::ResetView => {
                let _ = self.dispatch(Command::ResetView, now);
            }
            ReaderAction::Rotate => {
                let _ = self.dispatch(Command::Rotate, now);
            }
            ReaderAction::ToggleFullscreen => self.toggle_fullscreen(),
            ReaderAction::ToggleBookmark => self.toggle_bookmark(),
            ReaderAction::ToggleBookmarkPanel => self.toggle_bookmark_panel(),
            ReaderAction::ToggleSettingsPanel => self.toggle_settings_panel(),
            ReaderAction::ToggleAutoAdvance => self.toggle_auto_advance(now),
            ReaderAction::RetryLoad => {
                if !self.retry_load(now) {
                    return KeyOutcome::Ignored;
                }
            }
            ReaderAction::OpenFallback => {
                if self.document.error().is_none() {
                    return KeyOutcome::Ignored;
                }
                self.open_fallback();
            }
            ReaderAction::Escape => return self.escape(),
            ReaderAction::Quit => {
                self.should_quit = true;
                return KeyOutcome::Quit;
            }
        }
        KeyOutcome::Handled
    }

    fn handle_bookmark_panel_key(&mut self, key: &KeyEvent, now: Instant) -> Option<KeyOutcome> {
        let len = self.bookmarks.len();
        let panel = self.bookmark_panel.as_mut()?;
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => panel.select_next(len),
            KeyCode::Up | KeyCode::Char('k') => panel.select_previous(len),
            KeyCode::Enter => {
                let selected = panel.selected();
                let page = self
                    .bookmarks
                    .sorted_by_page()
                    .get(selected)
                    .map(|b| b.page);
                if let Some(page) = page {
                    self.bookmark_panel = None;
                    let _ = self.dispatch(Command::GoToPage(page), now);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                let selected = panel.selected();
                let id = self
                    .bookmarks
                    .sorted_by_page()
                    .get(selected)
                    .map(|b| b.id);
                if let Some(id) = id {
                    let _ = self.remove_bookmark(id);
                }
            }
            KeyCode::Esc | KeyCode::Char('m') => return Some(self.escape()),
            _ => return None,
        }
        Some(KeyOutcome::Handled)
    }

    fn handle_settings_panel_key(&mut self, key: &KeyEvent) -> Option<KeyOutcome> {
        let panel = self.settings_panel.as_mut()?;
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => panel.select_next(),
            KeyCode::Up | KeyCode::Char('k') => panel.select_previous(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                let row = panel.selected_row();
                self.update_settings(|s| row.activate(s));
            }
            KeyCode::Char('x') => self.reset_settings(),
            KeyCode::Esc | KeyCode::Char('s') => return Some(self.escape()),
            _ => return None,
        }
        Some(KeyOutcome::Handled)
    }

    // --- teardown -------------------------------------------------------------

    /// Cancel timers and flush the last progress update.
    pub fn close(mut self) {
        self.stop_auto_advance();
        self.gestures.reset();
        info!(
            "Closing reader for {} at page {}/{}",
            self.slug,
            self.nav.current_page(),
            self.nav.total_pages()
        );
        let sync = std::mem::replace(&mut self.progress_sync, ProgressSync::disabled());
        sync.shutdown();
    }
}
