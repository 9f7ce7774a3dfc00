use std::time::{Duration, Instant};

/// Repeating page-turn timer, polled from the run loop.
///
/// There is no background thread: the owner calls [`AutoAdvance::poll`]
/// on every tick and turns the page when it returns true. Dropping the
/// value cancels the timer.
#[derive(Debug)]
pub struct AutoAdvance {
    interval: Duration,
    next_due: Instant,
}

impl AutoAdvance {
    pub fn start(interval: Duration, now: Instant) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        Self {
            interval,
            next_due: now + interval,
        }
    }

    /// True once per elapsed interval. Missed intervals (a stalled loop)
    /// collapse into a single firing.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due = now + self.interval;
        true
    }

    /// Push the next firing a full interval out, e.g. after a manual page turn.
    pub fn restart(&mut self, now: Instant) {
        self.next_due = now + self.interval;
    }

    pub fn time_until_due(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }
}
