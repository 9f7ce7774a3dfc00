// Export modules for use in tests
pub mod api;
pub mod bookmark;
pub mod event_source;
pub mod events;
pub mod library;
pub mod notification;
pub mod panic_handler;
pub mod progress;
pub mod reader;
pub mod reader_app;
pub mod settings;
pub mod system_command;
pub mod theme;
pub mod widget;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export the reader entry points
pub use reader::{ReaderConfig, ReaderServices, ReaderSession};
pub use reader_app::run_reader_with_event_source;
