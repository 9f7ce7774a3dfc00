use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Reader-level commands reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderAction {
    PreviousPage,
    NextPage,
    FirstPage,
    LastPage,
    ZoomIn,
    ZoomOut,
    ResetView,
    Rotate,
    ToggleFullscreen,
    ToggleBookmark,
    ToggleBookmarkPanel,
    ToggleSettingsPanel,
    ToggleAutoAdvance,
    RetryLoad,
    OpenFallback,
    /// Close the top-most overlay, or the reader itself
    Escape,
    Quit,
}

impl ReaderAction {
    /// Actions that stay live while keyboard shortcuts are switched off,
    /// so the settings panel can still be reached to turn them back on.
    pub fn always_available(self) -> bool {
        matches!(
            self,
            ReaderAction::Escape | ReaderAction::Quit | ReaderAction::ToggleSettingsPanel
        )
    }
}

pub fn is_press(key: &KeyEvent) -> bool {
    key.kind != KeyEventKind::Release
}

pub fn reader_action(key: &KeyEvent) -> Option<ReaderAction> {
    if !is_press(key) {
        return None;
    }
    if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(ReaderAction::Quit)
            }
            _ => None,
        };
    }

    let action = match key.code {
        KeyCode::Left | KeyCode::Up | KeyCode::PageUp => ReaderAction::PreviousPage,
        KeyCode::Char('h') | KeyCode::Char('k') => ReaderAction::PreviousPage,
        KeyCode::Right | KeyCode::Down | KeyCode::PageDown => ReaderAction::NextPage,
        KeyCode::Char(' ') | KeyCode::Char('j') | KeyCode::Char('l') => ReaderAction::NextPage,
        KeyCode::Home => ReaderAction::FirstPage,
        KeyCode::End => ReaderAction::LastPage,
        KeyCode::Char('+') | KeyCode::Char('=') => ReaderAction::ZoomIn,
        KeyCode::Char('-') => ReaderAction::ZoomOut,
        KeyCode::Char('0') => ReaderAction::ResetView,
        KeyCode::Char('r') => ReaderAction::Rotate,
        KeyCode::Char('f') | KeyCode::F(11) => ReaderAction::ToggleFullscreen,
        KeyCode::Char('b') => ReaderAction::ToggleBookmark,
        KeyCode::Char('m') => ReaderAction::ToggleBookmarkPanel,
        KeyCode::Char('s') => ReaderAction::ToggleSettingsPanel,
        KeyCode::Char('a') => ReaderAction::ToggleAutoAdvance,
        KeyCode::Char('R') => ReaderAction::RetryLoad,
        KeyCode::Char('o') => ReaderAction::OpenFallback,
        KeyCode::Esc => ReaderAction::Escape,
        KeyCode::Char('q') => ReaderAction::Quit,
        _ => return None,
    };
    Some(action)
}
