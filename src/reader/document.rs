//! Document loading
//!
//! Rendering belongs to the external PDF engine; the reader only needs the
//! page count to drive navigation. Loading runs on its own thread so a slow
//! download can be abandoned after the load timeout.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use flume::{Receiver, TryRecvError};
use log::{debug, error, info};
use reqwest::blocking::Client;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use thiserror::Error;

use crate::api::ApiConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Path(PathBuf),
    Url(String),
}

impl DocumentSource {
    /// `http(s)://` locations are fetched, anything else is a local path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            DocumentSource::Url(location.to_string())
        } else {
            DocumentSource::Path(PathBuf::from(location))
        }
    }

    /// Argument for the system viewer fallback.
    pub fn location(&self) -> String {
        match self {
            DocumentSource::Path(path) => path.to_string_lossy().into_owned(),
            DocumentSource::Url(url) => url.clone(),
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.location())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("could not fetch document: {0}")]
    Fetch(String),
    #[error("could not read document: {0}")]
    Parse(String),
    #[error("document has no pages")]
    Empty,
    #[error("document did not load within {} seconds", .0.as_secs())]
    TimedOut(Duration),
    #[error("document loader stopped unexpectedly")]
    Aborted,
}

pub trait DocumentLoader: Send + Sync {
    fn load(&self, source: &DocumentSource) -> Result<DocumentInfo, LoadError>;
}

/// Loads PDFs from disk or over HTTP and counts their pages.
pub struct PdfDocumentLoader {
    client: Client,
}

impl PdfDocumentLoader {
    /// Remote documents are fetched with the same session as the API.
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        if let Some(value) = config
            .session_cookie
            .as_deref()
            .and_then(|c| HeaderValue::from_str(c).ok())
        {
            headers.insert(COOKIE, value);
        }
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self { client })
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| LoadError::Fetch(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Fetch(format!("server responded with {status}")));
        }
        let bytes = response
            .bytes()
            .map_err(|e| LoadError::Fetch(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl DocumentLoader for PdfDocumentLoader {
    fn load(&self, source: &DocumentSource) -> Result<DocumentInfo, LoadError> {
        let bytes = match source {
            DocumentSource::Path(path) => {
                std::fs::read(path).map_err(|e| LoadError::Fetch(format!("{path:?}: {e}")))?
            }
            DocumentSource::Url(url) => self.fetch(url)?,
        };
        debug!("Read {} bytes from {source}", bytes.len());
        let page_count = count_pages(&bytes)?;
        Ok(DocumentInfo {
            page_count,
            title: None,
        })
    }
}

pub fn count_pages(bytes: &[u8]) -> Result<usize, LoadError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| LoadError::Parse(e.to_string()))?;
    match doc.get_pages().len() {
        0 => Err(LoadError::Empty),
        n => Ok(n),
    }
}

/// A load running on a worker thread, abandoned once its deadline passes.
pub struct PendingLoad {
    rx: Receiver<Result<DocumentInfo, LoadError>>,
    deadline: Instant,
    timeout: Duration,
}

impl PendingLoad {
    pub fn start(
        loader: Arc<dyn DocumentLoader>,
        source: DocumentSource,
        timeout: Duration,
        now: Instant,
    ) -> Self {
        let (tx, rx) = flume::bounded(1);
        info!("Loading document {source}");

        let spawned = std::thread::Builder::new()
            .name("document-load".to_string())
            .spawn(move || {
                let result = loader.load(&source);
                // Receiver is gone if the load timed out
                let _ = tx.send(result);
            });
        if let Err(e) = spawned {
            // The sender was dropped with the closure, poll() reports Aborted
            error!("Failed to start document loader: {e}");
        }

        Self {
            rx,
            deadline: now + timeout,
            timeout,
        }
    }

    /// `None` while still loading.
    pub fn poll(&self, now: Instant) -> Option<Result<DocumentInfo, LoadError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) if now >= self.deadline => {
                Some(Err(LoadError::TimedOut(self.timeout)))
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(LoadError::Aborted)),
        }
    }

    /// Block until the load finishes or times out.
    pub fn wait(&self) -> Result<DocumentInfo, LoadError> {
        match self.rx.recv_deadline(self.deadline) {
            Ok(result) => result,
            Err(flume::RecvTimeoutError::Timeout) => Err(LoadError::TimedOut(self.timeout)),
            Err(flume::RecvTimeoutError::Disconnected) => Err(LoadError::Aborted),
        }
    }
}

pub enum DocumentState {
    Loading(PendingLoad),
    Ready(DocumentInfo),
    Failed(LoadError),
}

impl DocumentState {
    pub fn is_ready(&self) -> bool {
        matches!(self, DocumentState::Ready(_))
    }

    pub fn error(&self) -> Option<&LoadError> {
        match self {
            DocumentState::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Debug for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentState::Loading(_) => f.write_str("Loading"),
            DocumentState::Ready(info) => f.debug_tuple("Ready").field(info).finish(),
            DocumentState::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowLoader(Duration);

    impl DocumentLoader for SlowLoader {
        fn load(&self, _source: &DocumentSource) -> Result<DocumentInfo, LoadError> {
            std::thread::sleep(self.0);
            Ok(DocumentInfo {
                page_count: 3,
                title: None,
            })
        }
    }

    #[test]
    fn parse_source() {
        assert_eq!(
            DocumentSource::parse("https://cdn.example.com/a.pdf"),
            DocumentSource::Url("https://cdn.example.com/a.pdf".into())
        );
        assert_eq!(
            DocumentSource::parse("comics/a.pdf"),
            DocumentSource::Path(PathBuf::from("comics/a.pdf"))
        );
    }

    #[test]
    fn garbage_bytes_fail_to_parse() {
        assert!(matches!(count_pages(b"not a pdf"), Err(LoadError::Parse(_))));
    }

    #[test]
    fn missing_file_is_a_fetch_error() {
        let loader = PdfDocumentLoader::new(&ApiConfig::new("http://localhost")).unwrap();
        let result = loader.load(&DocumentSource::Path("/definitely/not/here.pdf".into()));
        assert!(matches!(result, Err(LoadError::Fetch(_))));
    }

    #[test]
    fn pending_load_completes() {
        let loader = Arc::new(SlowLoader(Duration::ZERO));
        let pending = PendingLoad::start(
            loader,
            DocumentSource::parse("a.pdf"),
            Duration::from_secs(10),
            Instant::now(),
        );
        assert_eq!(pending.wait().map(|i| i.page_count), Ok(3));
    }

    #[test]
    fn pending_load_times_out() {
        let loader = Arc::new(SlowLoader(Duration::from_secs(2)));
        let start = Instant::now();
        let pending = PendingLoad::start(
            loader,
            DocumentSource::parse("a.pdf"),
            Duration::from_millis(50),
            start,
        );
        assert_eq!(pending.poll(start), None);
        assert_eq!(
            pending.poll(start + Duration::from_millis(60)),
            Some(Err(LoadError::TimedOut(Duration::from_millis(50))))
        );
    }
}
