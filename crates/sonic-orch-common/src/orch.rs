//! Base Orch trait.

use std::time::Instant;

use async_trait::async_trait;

/// Base trait for all orchestration agents.
///
/// Each Orch module implements this trait to participate in the
/// OrchDaemon event loop. The daemon owns every registered Orch and drives
/// it from a single task, so implementations never see concurrent calls.
///
/// # Lifecycle
///
/// 1. Construction: Orch is created with its tables and collaborators
/// 2. Registration: the daemon takes ownership, ordered by [`Orch::priority`]
/// 3. Event Loop: `do_task()` runs whenever `has_pending_tasks()` is true,
///    `on_timer()` runs once the deadline from `next_timer_deadline()` passes
/// 4. Shutdown: `on_shutdown()` runs once before the daemon exits
#[async_trait]
pub trait Orch: Send {
    /// Returns the name of this Orch (for logging and debugging).
    fn name(&self) -> &str;

    /// Processes pending work from all consumers.
    async fn do_task(&mut self);

    /// Returns the priority of this Orch (lower = higher priority).
    fn priority(&self) -> i32 {
        0
    }

    /// Returns true if this Orch has pending work.
    fn has_pending_tasks(&self) -> bool {
        false
    }

    /// Dumps pending tasks for debugging.
    fn dump_pending_tasks(&self) -> Vec<String> {
        vec![]
    }

    /// Next instant at which `on_timer()` wants to run, if any timer is armed.
    fn next_timer_deadline(&self) -> Option<Instant> {
        None
    }

    /// Called by the daemon when the deadline from `next_timer_deadline()`
    /// has been reached.
    fn on_timer(&mut self, _now: Instant) {}

    /// Releases external state before the daemon exits.
    fn on_shutdown(&mut self) {}
}
