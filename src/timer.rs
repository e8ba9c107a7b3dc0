//! Deadline timers for search time management.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::sync::StopFlag;

/// A timer that signals a stop flag when a deadline is reached.
///
/// The timer runs in a background thread and sets the stop flag when the
/// deadline expires. Search code never blocks on the timer; it only polls
/// the flag.
pub struct DeadlineTimer {
    handle: Option<JoinHandle<()>>,
    stop_flag: StopFlag,
}

impl DeadlineTimer {
    /// Create and start a timer that will signal after the given duration.
    ///
    /// Returns `None` if the duration is zero (no timer needed).
    #[must_use]
    pub fn start(duration: Duration, stop_flag: StopFlag) -> Option<Self> {
        if duration.is_zero() {
            return None;
        }

        let flag_clone = stop_flag.clone();
        let handle = thread::spawn(move || {
            thread::sleep(duration);
            flag_clone.stop();
        });

        Some(DeadlineTimer {
            handle: Some(handle),
            stop_flag,
        })
    }

    /// Create and start a timer that will signal at the given deadline.
    ///
    /// Returns `None` if the deadline has already passed; in that case the
    /// stop flag is set immediately.
    #[must_use]
    pub fn start_at(deadline: Instant, stop_flag: StopFlag) -> Option<Self> {
        let now = Instant::now();
        if deadline > now {
            Self::start(deadline - now, stop_flag)
        } else {
            stop_flag.stop();
            None
        }
    }

    /// Detach the timer without waiting for it to fire.
    pub fn cancel(mut self) {
        self.handle.take();
    }

    /// Check if the timer has triggered.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.stop_flag.is_stopped()
    }
}

impl Drop for DeadlineTimer {
    fn drop(&mut self) {
        // Never join on drop; the sleeping thread finishes on its own.
    }
}
