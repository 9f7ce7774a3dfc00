use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CURRENT_VERSION: u32 = 1;
/// Key the reader settings live under in [`LocalStorage`].
pub const SETTINGS_KEY: &str = "comikrat.reader_settings";
const STORAGE_FILENAME: &str = "storage.json";
const APP_NAME: &str = "comikrat";

pub const MIN_AUTO_ADVANCE_SECS: u64 = 1;
pub const MAX_AUTO_ADVANCE_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReaderTheme {
    Light,
    #[default]
    Dark,
    Sepia,
}

impl ReaderTheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReaderTheme::Light => "Light",
            ReaderTheme::Dark => "Dark",
            ReaderTheme::Sepia => "Sepia",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ReaderTheme::Light => ReaderTheme::Dark,
            ReaderTheme::Dark => ReaderTheme::Sepia,
            ReaderTheme::Sepia => ReaderTheme::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    #[default]
    FitWidth,
    FitHeight,
    FitPage,
    Original,
}

impl FitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FitMode::FitWidth => "Fit width",
            FitMode::FitHeight => "Fit height",
            FitMode::FitPage => "Fit page",
            FitMode::Original => "Original",
        }
    }

    pub fn next(self) -> Self {
        match self {
            FitMode::FitWidth => FitMode::FitHeight,
            FitMode::FitHeight => FitMode::FitPage,
            FitMode::FitPage => FitMode::Original,
            FitMode::Original => FitMode::FitWidth,
        }
    }
}

/// Reader preferences. Client-local only; the server never sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderSettings {
    pub version: u32,
    pub theme: ReaderTheme,
    pub fit_mode: FitMode,
    pub gestures_enabled: bool,
    pub swipe_navigation: bool,
    pub double_tap_zoom: bool,
    pub pinch_zoom: bool,
    pub keyboard_shortcuts: bool,
    pub auto_advance: bool,
    pub auto_advance_delay_secs: u64,
    pub show_page_numbers: bool,
    pub show_progress_bar: bool,
    pub load_timeout_secs: u64,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            theme: ReaderTheme::default(),
            fit_mode: FitMode::default(),
            gestures_enabled: true,
            swipe_navigation: true,
            double_tap_zoom: true,
            pinch_zoom: true,
            keyboard_shortcuts: true,
            auto_advance: false,
            auto_advance_delay_secs: 5,
            show_page_numbers: true,
            show_progress_bar: true,
            load_timeout_secs: 30,
        }
    }
}

impl ReaderSettings {
    /// Clamp values a hand-edited store could have pushed out of range.
    pub fn sanitized(mut self) -> Self {
        self.auto_advance_delay_secs = self
            .auto_advance_delay_secs
            .clamp(MIN_AUTO_ADVANCE_SECS, MAX_AUTO_ADVANCE_SECS);
        if self.load_timeout_secs == 0 {
            self.load_timeout_secs = Self::default().load_timeout_secs;
        }
        self
    }
}

fn migrate_settings(settings: &mut ReaderSettings) {
    info!(
        "Migrating reader settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

/// File-backed key/value storage: one JSON object, one entry per key.
///
/// Values are kept as raw JSON so a malformed entry under one key never
/// prevents reading the others.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: Option<PathBuf>,
    entries: BTreeMap<String, serde_json::Value>,
}

impl LocalStorage {
    /// Storage that lives only as long as the process.
    pub fn ephemeral() -> Self {
        Self {
            path: None,
            entries: BTreeMap::new(),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|config| config.join(APP_NAME).join(STORAGE_FILENAME))
    }

    /// Open the storage file. A missing or unreadable file yields empty storage
    /// that will be written to `path` on the next `set`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    error!("Storage file {path:?} is malformed, starting empty: {e}");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Storage file {path:?} not found, starting empty");
                BTreeMap::new()
            }
            Err(e) => {
                error!("Failed to read storage file {path:?}: {e}");
                BTreeMap::new()
            }
        };
        Self {
            path: Some(path),
            entries,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.entries.get(key)
    }

    pub fn set(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    pub fn remove(&mut self, key: &str) -> Result<(), SettingsError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), SettingsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let content = serde_json::to_string_pretty(&self.entries)?;
        fs::write(path, content).map_err(|source| SettingsError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("Saved storage to {path:?}");
        Ok(())
    }
}

/// The single place reader settings are read from and written to.
#[derive(Debug)]
pub struct SettingsStore {
    storage: LocalStorage,
}

impl SettingsStore {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    /// Settings store at the platform config location, or ephemeral when
    /// there is no config directory.
    pub fn open_default() -> Self {
        match LocalStorage::default_path() {
            Some(path) => Self::new(LocalStorage::open(path)),
            None => {
                warn!("Could not determine config directory, settings will not persist");
                Self::new(LocalStorage::ephemeral())
            }
        }
    }

    /// Restore settings, falling back to defaults when absent or malformed.
    pub fn load(&mut self) -> ReaderSettings {
        let Some(value) = self.storage.get(SETTINGS_KEY) else {
            debug!("No stored reader settings, using defaults");
            return ReaderSettings::default();
        };

        match serde_json::from_value::<ReaderSettings>(value.clone()) {
            Ok(mut settings) => {
                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    if let Err(e) = self.save(&settings) {
                        error!("Failed to persist migrated settings: {e}");
                    }
                }
                settings.sanitized()
            }
            Err(e) => {
                warn!("Stored reader settings are malformed, using defaults: {e}");
                ReaderSettings::default()
            }
        }
    }

    pub fn save(&mut self, settings: &ReaderSettings) -> Result<(), SettingsError> {
        let value = serde_json::to_value(settings)?;
        self.storage.set(SETTINGS_KEY, value)
    }

    /// Restore and persist the defaults.
    pub fn reset(&mut self) -> Result<ReaderSettings, SettingsError> {
        let defaults = ReaderSettings::default();
        self.save(&defaults)?;
        Ok(defaults)
    }
}
