//! Client-side filtering and sorting of the user's comic library

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::progress;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub current_page: usize,
    #[serde(default)]
    pub total_pages: usize,
    #[serde(default)]
    pub last_read_at: Option<DateTime<Utc>>,
}

impl LibraryEntry {
    pub fn progress_percentage(&self) -> f32 {
        progress::percentage(self.current_page, self.total_pages)
    }

    pub fn is_completed(&self) -> bool {
        self.total_pages > 0 && self.current_page >= self.total_pages
    }

    pub fn status(&self) -> ReadStatus {
        if self.is_completed() {
            ReadStatus::Completed
        } else if self.current_page > 0 {
            ReadStatus::Reading
        } else {
            ReadStatus::Unread
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    Unread,
    Reading,
    Completed,
}

impl ReadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadStatus::Unread => "unread",
            ReadStatus::Reading => "reading",
            ReadStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StatusFilter {
    #[default]
    All,
    Unread,
    Reading,
    Completed,
}

impl StatusFilter {
    fn accepts(self, status: ReadStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Unread => status == ReadStatus::Unread,
            StatusFilter::Reading => status == ReadStatus::Reading,
            StatusFilter::Completed => status == ReadStatus::Completed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LibrarySort {
    /// Most recently read first, never-read comics last
    #[default]
    RecentlyRead,
    Title,
    Author,
    /// Highest completion percentage first
    Progress,
}

#[derive(Debug, Clone, Default)]
pub struct LibraryFilter {
    /// Case-insensitive substring matched against title and author
    pub search: Option<String>,
    /// Exact genre match, case-insensitive
    pub genre: Option<String>,
    pub status: StatusFilter,
}

impl LibraryFilter {
    pub fn matches(&self, entry: &LibraryEntry) -> bool {
        if !self.status.accepts(entry.status()) {
            return false;
        }

        if let Some(genre) = self.genre.as_deref().filter(|g| !g.trim().is_empty()) {
            let genre = genre.trim();
            if !entry.genres.iter().any(|g| g.eq_ignore_ascii_case(genre)) {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(needle) => {
                let needle = needle.to_lowercase();
                entry.title.to_lowercase().contains(&needle)
                    || entry
                        .author
                        .as_deref()
                        .is_some_and(|a| a.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }
}

/// Filter then sort. Ties fall back to title so the order is stable across runs.
pub fn apply<'a>(
    entries: &'a [LibraryEntry],
    filter: &LibraryFilter,
    sort: LibrarySort,
) -> Vec<&'a LibraryEntry> {
    let mut selected: Vec<&LibraryEntry> = entries.iter().filter(|e| filter.matches(e)).collect();
    selected.sort_by(|a, b| compare(a, b, sort).then_with(|| by_title(a, b)));
    selected
}

fn compare(a: &LibraryEntry, b: &LibraryEntry, sort: LibrarySort) -> Ordering {
    match sort {
        LibrarySort::RecentlyRead => match (a.last_read_at, b.last_read_at) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        LibrarySort::Title => by_title(a, b),
        LibrarySort::Author => {
            let a_author = a.author.as_deref().unwrap_or("").to_lowercase();
            let b_author = b.author.as_deref().unwrap_or("").to_lowercase();
            a_author.cmp(&b_author)
        }
        LibrarySort::Progress => b
            .progress_percentage()
            .partial_cmp(&a.progress_percentage())
            .unwrap_or(Ordering::Equal),
    }
}

fn by_title(a: &LibraryEntry, b: &LibraryEntry) -> Ordering {
    a.title.to_lowercase().cmp(&b.title.to_lowercase())
}

/// All distinct genres, sorted, for building a filter sidebar.
pub fn genres(entries: &[LibraryEntry]) -> Vec<String> {
    let mut all: Vec<String> = entries
        .iter()
        .flat_map(|e| e.genres.iter().cloned())
        .collect();
    all.sort_by_key(|g| g.to_lowercase());
    all.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(slug: &str, title: &str, author: &str, page: usize, total: usize) -> LibraryEntry {
        LibraryEntry {
            slug: slug.to_string(),
            title: title.to_string(),
            author: Some(author.to_string()),
            genres: vec![],
            current_page: page,
            total_pages: total,
            last_read_at: None,
        }
    }

    fn sample() -> Vec<LibraryEntry> {
        let mut saga = entry("saga", "Saga", "Brian K. Vaughan", 40, 40);
        saga.genres = vec!["Sci-Fi".into(), "Fantasy".into()];
        saga.last_read_at = Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());

        let mut paper = entry("paper-girls", "Paper Girls", "Brian K. Vaughan", 10, 30);
        paper.genres = vec!["sci-fi".into()];
        paper.last_read_at = Some(Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap());

        let mut monstress = entry("monstress", "Monstress", "Marjorie Liu", 0, 50);
        monstress.genres = vec!["Fantasy".into()];

        vec![saga, paper, monstress]
    }

    fn slugs(entries: &[&LibraryEntry]) -> Vec<String> {
        entries.iter().map(|e| e.slug.clone()).collect()
    }

    #[test]
    fn recently_read_puts_unread_last() {
        let library = sample();
        let result = apply(&library, &LibraryFilter::default(), LibrarySort::RecentlyRead);
        assert_eq!(slugs(&result), vec!["paper-girls", "saga", "monstress"]);
    }

    #[test]
    fn search_matches_author_case_insensitively() {
        let library = sample();
        let filter = LibraryFilter {
            search: Some("marjorie".into()),
            ..Default::default()
        };
        let result = apply(&library, &filter, LibrarySort::Title);
        assert_eq!(slugs(&result), vec!["monstress"]);
    }

    #[test]
    fn genre_filter_ignores_case() {
        let library = sample();
        let filter = LibraryFilter {
            genre: Some("SCI-FI".into()),
            ..Default::default()
        };
        let result = apply(&library, &filter, LibrarySort::Title);
        assert_eq!(slugs(&result), vec!["paper-girls", "saga"]);
    }

    #[test]
    fn status_filter() {
        let library = sample();
        let completed = LibraryFilter {
            status: StatusFilter::Completed,
            ..Default::default()
        };
        assert_eq!(
            slugs(&apply(&library, &completed, LibrarySort::Title)),
            vec!["saga"]
        );

        let unread = LibraryFilter {
            status: StatusFilter::Unread,
            ..Default::default()
        };
        assert_eq!(
            slugs(&apply(&library, &unread, LibrarySort::Title)),
            vec!["monstress"]
        );
    }

    #[test]
    fn progress_sort_descending() {
        let library = sample();
        let result = apply(&library, &LibraryFilter::default(), LibrarySort::Progress);
        assert_eq!(slugs(&result), vec!["saga", "paper-girls", "monstress"]);
    }

    #[test]
    fn author_sort_breaks_ties_by_title() {
        let library = sample();
        let result = apply(&library, &LibraryFilter::default(), LibrarySort::Author);
        assert_eq!(slugs(&result), vec!["paper-girls", "saga", "monstress"]);
    }

    #[test]
    fn genres_are_deduplicated() {
        assert_eq!(genres(&sample()), vec!["Fantasy", "Sci-Fi"]);
    }
}
