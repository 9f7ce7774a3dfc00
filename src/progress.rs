//! Reading progress for a comic/user pair
//!
//! The server owns the authoritative record. The reader keeps a local copy
//! that is recomputed on every committed page change and pushed back through
//! [`crate::reader::ProgressSync`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingProgress {
    pub current_page: usize,
    pub total_pages: usize,
    #[serde(default)]
    pub progress_percentage: f32,
    #[serde(default)]
    pub reading_time_minutes: u32,
    #[serde(default)]
    pub is_completed: bool,
}

impl ReadingProgress {
    /// Build a progress record, deriving percentage and completion from the page counts.
    pub fn compute(current_page: usize, total_pages: usize, reading_time_minutes: u32) -> Self {
        Self {
            current_page,
            total_pages,
            progress_percentage: percentage(current_page, total_pages),
            reading_time_minutes,
            is_completed: total_pages > 0 && current_page >= total_pages,
        }
    }

    /// Recompute the derived fields. Server responses are normalized through
    /// this so a stale percentage never reaches the UI.
    pub fn normalized(self) -> Self {
        Self::compute(
            self.current_page,
            self.total_pages,
            self.reading_time_minutes,
        )
    }
}

/// Body of `PATCH /api/comics/{slug}/progress`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub current_page: usize,
    pub total_pages: usize,
    pub reading_time_minutes: u32,
}

impl ProgressUpdate {
    pub fn new(current_page: usize, total_pages: usize, elapsed: Duration) -> Self {
        Self {
            current_page,
            total_pages,
            reading_time_minutes: reading_minutes(elapsed),
        }
    }
}

impl From<ProgressUpdate> for ReadingProgress {
    fn from(update: ProgressUpdate) -> Self {
        ReadingProgress::compute(
            update.current_page,
            update.total_pages,
            update.reading_time_minutes,
        )
    }
}

/// `current / total * 100`, clamped to [0, 100]. An empty document is 0%.
pub fn percentage(current_page: usize, total_pages: usize) -> f32 {
    if total_pages == 0 {
        return 0.0;
    }
    let pct = current_page as f64 / total_pages as f64 * 100.0;
    pct.clamp(0.0, 100.0) as f32
}

/// Whole minutes of wall-clock reading time.
pub fn reading_minutes(elapsed: Duration) -> u32 {
    u32::try_from(elapsed.as_secs() / 60).unwrap_or(u32::MAX)
}
