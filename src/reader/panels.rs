//! Selection state for the bookmark and settings overlays

use crate::settings::{MAX_AUTO_ADVANCE_SECS, ReaderSettings};

/// Delays offered when cycling the auto-advance setting
const AUTO_ADVANCE_STEPS: [u64; 6] = [3, 5, 10, 15, 30, MAX_AUTO_ADVANCE_SECS];

#[derive(Debug, Default, Clone)]
pub struct BookmarkPanel {
    selected: usize,
}

impl BookmarkPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn select_next(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    pub fn select_previous(&mut self, len: usize) {
        if len > 0 {
            self.selected = self.selected.checked_sub(1).unwrap_or(len - 1);
        }
    }

    /// Keep the selection valid after the list shrank.
    pub fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingRow {
    Theme,
    FitMode,
    Gestures,
    SwipeNavigation,
    DoubleTapZoom,
    PinchZoom,
    KeyboardShortcuts,
    AutoAdvance,
    AutoAdvanceDelay,
    PageNumbers,
    ProgressBar,
}

impl SettingRow {
    pub const ALL: [SettingRow; 11] = [
        SettingRow::Theme,
        SettingRow::FitMode,
        SettingRow::Gestures,
        SettingRow::SwipeNavigation,
        SettingRow::DoubleTapZoom,
        SettingRow::PinchZoom,
        SettingRow::KeyboardShortcuts,
        SettingRow::AutoAdvance,
        SettingRow::AutoAdvanceDelay,
        SettingRow::PageNumbers,
        SettingRow::ProgressBar,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SettingRow::Theme => "Theme",
            SettingRow::FitMode => "Fit mode",
            SettingRow::Gestures => "Touch gestures",
            SettingRow::SwipeNavigation => "Swipe to turn pages",
            SettingRow::DoubleTapZoom => "Double-tap zoom",
            SettingRow::PinchZoom => "Pinch zoom",
            SettingRow::KeyboardShortcuts => "Keyboard shortcuts",
            SettingRow::AutoAdvance => "Auto-advance",
            SettingRow::AutoAdvanceDelay => "Auto-advance delay",
            SettingRow::PageNumbers => "Page numbers",
            SettingRow::ProgressBar => "Progress bar",
        }
    }

    pub fn value(self, settings: &ReaderSettings) -> String {
        let on_off = |b: bool| if b { "On" } else { "Off" }.to_string();
        match self {
            SettingRow::Theme => settings.theme.as_str().to_string(),
            SettingRow::FitMode => settings.fit_mode.as_str().to_string(),
            SettingRow::Gestures => on_off(settings.gestures_enabled),
            SettingRow::SwipeNavigation => on_off(settings.swipe_navigation),
            SettingRow::DoubleTapZoom => on_off(settings.double_tap_zoom),
            SettingRow::PinchZoom => on_off(settings.pinch_zoom),
            SettingRow::KeyboardShortcuts => on_off(settings.keyboard_shortcuts),
            SettingRow::AutoAdvance => on_off(settings.auto_advance),
            SettingRow::AutoAdvanceDelay => format!("{}s", settings.auto_advance_delay_secs),
            SettingRow::PageNumbers => on_off(settings.show_page_numbers),
            SettingRow::ProgressBar => on_off(settings.show_progress_bar),
        }
    }

    /// Toggle or cycle the value
    pub fn activate(self, settings: &mut ReaderSettings) {
        match self {
            SettingRow::Theme => settings.theme = settings.theme.next(),
            SettingRow::FitMode => settings.fit_mode = settings.fit_mode.next(),
            SettingRow::Gestures => settings.gestures_enabled ^= true,
            SettingRow::SwipeNavigation => settings.swipe_navigation ^= true,
            SettingRow::DoubleTapZoom => settings.double_tap_zoom ^= true,
            SettingRow::PinchZoom => settings.pinch_zoom ^= true,
            SettingRow::KeyboardShortcuts => settings.keyboard_shortcuts ^= true,
            SettingRow::AutoAdvance => settings.auto_advance ^= true,
            SettingRow::AutoAdvanceDelay => {
                settings.auto_advance_delay_secs = AUTO_ADVANCE_STEPS
                    .iter()
                    .copied()
                    .find(|&s| s > settings.auto_advance_delay_secs)
                    .unwrap_or(AUTO_ADVANCE_STEPS[0]);
            }
            SettingRow::PageNumbers => settings.show_page_numbers ^= true,
            SettingRow::ProgressBar => settings.show_progress_bar ^= true,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct SettingsPanel {
    selected: usize,
}

impl SettingsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_row(&self) -> SettingRow {
        SettingRow::ALL[self.selected.min(SettingRow::ALL.len() - 1)]
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % SettingRow::ALL.len();
    }

    pub fn select_previous(&mut self) {
        self.selected = self
            .selected
            .checked_sub(1)
            .unwrap_or(SettingRow::ALL.len() - 1);
    }
}
