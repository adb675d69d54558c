//! Interval timer driven by the daemon loop.
//!
//! The timer does not sleep on its own; the owning Orch reports
//! [`SelectableTimer::deadline`] through `Orch::next_timer_deadline` and
//! calls [`SelectableTimer::fire`] from `Orch::on_timer`.

use std::time::{Duration, Instant};

/// Restartable periodic timer.
///
/// A new timer is stopped. A zero interval never arms.
#[derive(Debug, Clone)]
pub struct SelectableTimer {
    interval: Duration,
    deadline: Option<Instant>,
}

impl SelectableTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Changes the period; an armed countdown keeps its current deadline.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Restarts the countdown from `now`.
    pub fn reset(&mut self, now: Instant) {
        self.deadline = if self.interval.is_zero() {
            None
        } else {
            Some(now + self.interval)
        };
    }

    /// Disarms the timer. Stopping a stopped timer does nothing.
    ///
    /// Returns whether the timer was running.
    pub fn stop(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }

    /// Consumes an expiry and schedules the next one.
    ///
    /// Returns false if the timer had not expired.
    pub fn fire(&mut self, now: Instant) -> bool {
        if !self.is_expired(now) {
            return false;
        }
        self.reset(now);
        true
    }
}
