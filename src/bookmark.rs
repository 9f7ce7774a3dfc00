use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::api::{ApiResult, ComicsApi};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: u64,
    #[serde(alias = "page_number")]
    pub page: usize,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-side mirror of the bookmarks for one comic.
///
/// Every mutation waits for the server to confirm before the mirror changes,
/// so a failed request leaves the local set exactly as it was. Failures are
/// logged and handed back to the caller, which may choose to ignore them.
pub struct BookmarkClient {
    api: Arc<dyn ComicsApi>,
    slug: String,
    bookmarks: Vec<Bookmark>,
}

impl BookmarkClient {
    pub fn new(api: Arc<dyn ComicsApi>, slug: impl Into<String>) -> Self {
        Self {
            api,
            slug: slug.into(),
            bookmarks: Vec::new(),
        }
    }

    /// Replace the mirror with the server's bookmark set.
    pub fn list(&mut self) -> ApiResult<&[Bookmark]> {
        match self.api.list_bookmarks(&self.slug) {
            Ok(bookmarks) => {
                debug!("Loaded {} bookmarks for {}", bookmarks.len(), self.slug);
                self.bookmarks = bookmarks;
                Ok(&self.bookmarks)
            }
            Err(e) => {
                error!("Failed to load bookmarks for {}: {e}", self.slug);
                Err(e)
            }
        }
    }

    /// Replace the mirror with a set fetched elsewhere.
    pub fn replace(&mut self, bookmarks: Vec<Bookmark>) {
        self.bookmarks = bookmarks;
    }

    pub fn add(&mut self, page: usize, note: Option<String>) -> ApiResult<&Bookmark> {
        match self.api.create_bookmark(&self.slug, page, note.as_deref()) {
            Ok(bookmark) => {
                info!("Bookmarked page {page} of {}", self.slug);
                self.bookmarks.push(bookmark);
                let idx = self.bookmarks.len() - 1;
                Ok(&self.bookmarks[idx])
            }
            Err(e) => {
                error!("Failed to bookmark page {page} of {}: {e}", self.slug);
                Err(e)
            }
        }
    }

    pub fn update(&mut self, id: u64, note: Option<String>) -> ApiResult<()> {
        match self.api.update_bookmark(&self.slug, id, note.as_deref()) {
            Ok(updated) => {
                if let Some(existing) = self.bookmarks.iter_mut().find(|b| b.id == id) {
                    *existing = updated;
                } else {
                    self.bookmarks.push(updated);
                }
                Ok(())
            }
            Err(e) => {
                error!("Failed to update bookmark {id} of {}: {e}", self.slug);
                Err(e)
            }
        }
    }

    pub fn remove(&mut self, id: u64) -> ApiResult<()> {
        match self.api.delete_bookmark(&self.slug, id) {
            Ok(()) => {
                self.bookmarks.retain(|b| b.id != id);
                Ok(())
            }
            Err(e) => {
                error!("Failed to delete bookmark {id} of {}: {e}", self.slug);
                Err(e)
            }
        }
    }

    /// Remove the bookmark on `page` if there is one, otherwise add one.
    /// Returns true when the page ends up bookmarked.
    pub fn toggle(&mut self, page: usize) -> ApiResult<bool> {
        match self.for_page(page).map(|b| b.id) {
            Some(id) => self.remove(id).map(|()| false),
            None => self.add(page, None).map(|_| true),
        }
    }

    pub fn for_page(&self, page: usize) -> Option<&Bookmark> {
        self.bookmarks.iter().find(|b| b.page == page)
    }

    pub fn is_bookmarked(&self, page: usize) -> bool {
        self.for_page(page).is_some()
    }

    pub fn get(&self, id: u64) -> Option<&Bookmark> {
        self.bookmarks.iter().find(|b| b.id == id)
    }

    /// Bookmarks in server order.
    pub fn all(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    /// Bookmarks ordered by page, then creation time.
    pub fn sorted_by_page(&self) -> Vec<&Bookmark> {
        let mut sorted: Vec<&Bookmark> = self.bookmarks.iter().collect();
        sorted.sort_by(|a, b| a.page.cmp(&b.page).then(a.created_at.cmp(&b.created_at)));
        sorted
    }

    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }
}
