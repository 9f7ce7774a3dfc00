//! REST client for the comics backend
//!
//! The backend owns entitlements, bookmarks and progress. This module only
//! speaks its JSON endpoints; [`ComicsApi`] is the seam the reader and the
//! tests plug into.

mod client;
mod error;

pub use client::{ApiConfig, HttpComicsApi};
pub use error::{ApiError, ApiResult};

use crate::bookmark::Bookmark;
use crate::library::LibraryEntry;
use crate::progress::{ProgressUpdate, ReadingProgress};

/// Endpoints of the comics API consumed by the reader.
pub trait ComicsApi: Send + Sync {
    /// `GET /api/comics/{slug}/bookmarks`
    fn list_bookmarks(&self, slug: &str) -> ApiResult<Vec<Bookmark>>;

    /// `POST /api/comics/{slug}/bookmarks`
    fn create_bookmark(&self, slug: &str, page: usize, note: Option<&str>) -> ApiResult<Bookmark>;

    /// `PATCH /api/comics/{slug}/bookmarks/{id}`
    fn update_bookmark(&self, slug: &str, id: u64, note: Option<&str>) -> ApiResult<Bookmark>;

    /// `DELETE /api/comics/{slug}/bookmarks/{id}`
    fn delete_bookmark(&self, slug: &str, id: u64) -> ApiResult<()>;

    /// `GET /api/comics/{slug}/progress`
    fn get_progress(&self, slug: &str) -> ApiResult<ReadingProgress>;

    /// `PATCH /api/comics/{slug}/progress`
    fn update_progress(&self, slug: &str, update: &ProgressUpdate) -> ApiResult<ReadingProgress>;

    /// `GET /api/library`
    fn library(&self) -> ApiResult<Vec<LibraryEntry>>;
}
