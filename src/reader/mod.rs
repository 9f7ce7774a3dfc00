//! The comic reader: view state, input interpretation and the shell that ties
//! them to the backend.

pub mod auto_advance;
pub mod document;
pub mod gesture;
pub mod keymap;
pub mod navigation;
pub mod panels;
pub mod progress_sync;
pub mod server_state;
pub mod session;

pub use document::{DocumentLoader, DocumentSource, DocumentState, LoadError, PdfDocumentLoader};
pub use navigation::{Command, Effect, NavigationState, Rotation};
pub use session::{KeyOutcome, ReaderConfig, ReaderServices, ReaderSession};
