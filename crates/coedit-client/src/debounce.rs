//! Keystroke debouncer: coalesce rapid local edits into one change frame.
//!
//! Every edit replaces the pending snapshot and restarts the quiet period,
//! so a burst of typing produces exactly one frame carrying the final text.
//! Uses tokio's clock, which makes the timing testable under a paused
//! runtime.

use std::time::Duration;

use tokio::time::Instant;

pub struct EditDebouncer {
    window: Duration,
    pending: Option<String>,
    deadline: Option<Instant>,
}

impl EditDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            deadline: None,
        }
    }

    /// Record the latest full buffer. Only the newest snapshot survives.
    pub fn record(&mut self, content: String) {
        self.pending = Some(content);
        self.deadline = Some(Instant::now() + self.window);
    }

    /// When the next flush is due, if anything is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Take the pending snapshot once the quiet period has elapsed.
    pub fn take_ready(&mut self) -> Option<String> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    /// Take whatever is pending regardless of the deadline, e.g. right
    /// before an orderly shutdown.
    pub fn flush(&mut self) -> Option<String> {
        self.deadline = None;
        self.pending.take()
    }

    /// Drop any pending edit. Used when the transport goes away: the
    /// snapshot would be stale by the time the session rejoins.
    pub fn clear(&mut self) {
        self.deadline = None;
        self.pending = None;
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }
}
