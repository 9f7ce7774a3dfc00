//! Short-lived status messages shown over the reader ("Bookmarked page 4")

use std::time::{Duration, Instant};

const DEFAULT_DURATION: Duration = Duration::from_secs(3);
const MAX_QUEUED: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub expires_at: Instant,
}

impl Notification {
    pub fn new(
        message: impl Into<String>,
        level: NotificationLevel,
        now: Instant,
        duration: Duration,
    ) -> Self {
        Self {
            message: message.into(),
            level,
            expires_at: now + duration,
        }
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Newest first; the oldest entries fall off past a small cap.
#[derive(Debug)]
pub struct NotificationManager {
    notifications: Vec<Notification>,
    duration: Duration,
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationManager {
    pub fn new() -> Self {
        Self::with_duration(DEFAULT_DURATION)
    }

    pub fn with_duration(duration: Duration) -> Self {
        Self {
            notifications: Vec::new(),
            duration,
        }
    }

    pub fn notify(&mut self, message: impl Into<String>, level: NotificationLevel) {
        let notification = Notification::new(message, level, Instant::now(), self.duration);
        self.notifications.insert(0, notification);
        self.notifications.truncate(MAX_QUEUED);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Info);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Warning);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Error);
    }

    /// Remove expired notifications, returns true if any were removed
    pub fn update(&mut self, now: Instant) -> bool {
        let initial_len = self.notifications.len();
        self.notifications.retain(|n| !n.is_expired_at(now));
        self.notifications.len() != initial_len
    }

    pub fn current(&self) -> Option<&Notification> {
        self.notifications.first()
    }

    pub fn dismiss_current(&mut self) -> bool {
        if self.notifications.is_empty() {
            false
        } else {
            self.notifications.remove(0);
            true
        }
    }

    pub fn count(&self) -> usize {
        self.notifications.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_is_current() {
        let mut manager = NotificationManager::new();
        manager.info("First");
        manager.error("Second");

        let current = manager.current().unwrap();
        assert_eq!(current.message, "Second");
        assert_eq!(current.level, NotificationLevel::Error);
    }

    #[test]
    fn expired_are_removed() {
        let mut manager = NotificationManager::with_duration(Duration::from_secs(2));
        manager.info("Short-lived");

        assert!(!manager.update(Instant::now()));
        assert!(manager.update(Instant::now() + Duration::from_secs(3)));
        assert_eq!(manager.count(), 0);
    }

    #[test]
    fn queue_is_capped() {
        let mut manager = NotificationManager::new();
        for i in 0..20 {
            manager.info(format!("message {i}"));
        }
        assert_eq!(manager.count(), MAX_QUEUED);
        assert_eq!(manager.current().unwrap().message, "message 19");
    }

    #[test]
    fn dismiss_reveals_previous() {
        let mut manager = NotificationManager::new();
        manager.info("First");
        manager.info("Second");
        assert!(manager.dismiss_current());
        assert_eq!(manager.current().unwrap().message, "First");
        assert!(manager.dismiss_current());
        assert!(!manager.dismiss_current());
    }
}
