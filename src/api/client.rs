use std::time::Duration;

use log::{debug, trace};
use reqwest::{Method, Url};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, COOKIE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiResult};
use super::ComicsApi;
use crate::bookmark::Bookmark;
use crate::library::LibraryEntry;
use crate::progress::{ProgressUpdate, ReadingProgress};

/// Header carrying the CSRF token on every mutating request.
pub const CSRF_HEADER: &str = "X-CSRF-TOKEN";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Scheme and host, e.g. `https://comics.example.com`
    pub base_url: String,
    pub csrf_token: Option<String>,
    /// Raw `Cookie` header value holding the session
    pub session_cookie: Option<String>,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            csrf_token: None,
            session_cookie: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Responses come either wrapped in `{ "data": ... }` or bare.
#[derive(Deserialize)]
#[serde(untagged)]
enum Payload<T> {
    Enveloped { data: T },
    Bare(T),
}

impl<T> Payload<T> {
    fn into_inner(self) -> T {
        match self {
            Payload::Enveloped { data } => data,
            Payload::Bare(value) => value,
        }
    }
}

#[derive(Serialize)]
struct CreateBookmarkBody<'a> {
    page_number: usize,
    note: Option<&'a str>,
}

#[derive(Serialize)]
struct UpdateBookmarkBody<'a> {
    note: Option<&'a str>,
}

/// [`ComicsApi`] over HTTPS with session-cookie authentication.
pub struct HttpComicsApi {
    client: Client,
    config: ApiConfig,
    base: Url,
}

impl HttpComicsApi {
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let base = match Url::parse(&config.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            _ => return Err(ApiError::InvalidUrl(config.base_url)),
        };

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "X-Requested-With",
            HeaderValue::from_static("XMLHttpRequest"),
        );
        if let Some(cookie) = &config.session_cookie {
            let value =
                HeaderValue::from_str(cookie).map_err(|_| ApiError::InvalidHeader("Cookie"))?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            config,
            base,
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Append percent-encoded path segments to the base URL.
    fn url(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.config.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> ApiResult<RequestBuilder> {
        let mutating = method != Method::GET;
        let mut builder = self.client.request(method, self.url(segments)?);
        if mutating {
            if let Some(token) = &self.config.csrf_token {
                builder = builder.header(CSRF_HEADER, token);
            }
        }
        Ok(builder)
    }

    fn send(&self, builder: RequestBuilder) -> ApiResult<Response> {
        let response = builder.send()?;
        let status = response.status();
        trace!("{} -> {}", response.url(), status);
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().unwrap_or_default();
            Err(ApiError::status(status.as_u16(), &body))
        }
    }

    fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let bytes = response.bytes()?;
        let payload: Payload<T> = serde_json::from_slice(&bytes)?;
        Ok(payload.into_inner())
    }
}

fn bookmarks_path(slug: &str) -> [&str; 4] {
    ["api", "comics", slug, "bookmarks"]
}

fn progress_path(slug: &str) -> [&str; 4] {
    ["api", "comics", slug, "progress"]
}

impl ComicsApi for HttpComicsApi {
    fn list_bookmarks(&self, slug: &str) -> ApiResult<Vec<Bookmark>> {
        let response = self.send(self.request(Method::GET, &bookmarks_path(slug))?)?;
        Self::decode(response)
    }

    fn create_bookmark(&self, slug: &str, page: usize, note: Option<&str>) -> ApiResult<Bookmark> {
        debug!("POST bookmark {slug} page {page}");
        let body = CreateBookmarkBody {
            page_number: page,
            note,
        };
        let response = self.send(self.request(Method::POST, &bookmarks_path(slug))?.json(&body))?;
        Self::decode(response)
    }

    fn update_bookmark(&self, slug: &str, id: u64, note: Option<&str>) -> ApiResult<Bookmark> {
        debug!("PATCH bookmark {slug}/{id}");
        let body = UpdateBookmarkBody { note };
        let id = id.to_string();
        let response = self.send(
            self.request(Method::PATCH, &["api", "comics", slug, "bookmarks", &id])?
                .json(&body),
        )?;
        Self::decode(response)
    }

    fn delete_bookmark(&self, slug: &str, id: u64) -> ApiResult<()> {
        debug!("DELETE bookmark {slug}/{id}");
        let id = id.to_string();
        self.send(self.request(Method::DELETE, &["api", "comics", slug, "bookmarks", &id])?)?;
        Ok(())
    }

    fn get_progress(&self, slug: &str) -> ApiResult<ReadingProgress> {
        let response = self.send(self.request(Method::GET, &progress_path(slug))?)?;
        Self::decode::<ReadingProgress>(response).map(ReadingProgress::normalized)
    }

    fn update_progress(&self, slug: &str, update: &ProgressUpdate) -> ApiResult<ReadingProgress> {
        debug!(
            "PATCH progress {slug}: page {}/{} ({} min)",
            update.current_page, update.total_pages, update.reading_time_minutes
        );
        let response = self.send(self.request(Method::PATCH, &progress_path(slug))?.json(update))?;
        Self::decode::<ReadingProgress>(response).map(ReadingProgress::normalized)
    }

    fn library(&self) -> ApiResult<Vec<LibraryEntry>> {
        let response = self.send(self.request(Method::GET, &["api", "library"])?)?;
        Self::decode(response)
    }
}
