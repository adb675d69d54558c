//! OrchDaemon implementation.
//!
//! The OrchDaemon is the central coordinator for all Orch modules.
//! It manages:
//! - Orch registration and priority ordering
//! - Task dispatch to Orchs with pending work
//! - Timer deadlines, so polling Orchs are woken on time
//! - Early wakeups when a producer signals [`OrchDaemon::waker`]
//! - Orderly shutdown of every Orch

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info};
use sonic_orch_common::Orch;
use std::collections::BTreeMap;
use tokio::sync::Notify;

use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::audit_log;

/// Configuration for the OrchDaemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchDaemonConfig {
    /// Longest the loop sleeps without a timer deadline, in milliseconds
    pub heartbeat_interval_ms: u64,
}

impl Default for OrchDaemonConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: 1000,
        }
    }
}

/// The main orchestration daemon.
///
/// OrchDaemon coordinates all Orch modules and runs the main event loop.
pub struct OrchDaemon {
    /// Configuration
    config: OrchDaemonConfig,
    /// Registered Orchs sorted by priority
    orchs: BTreeMap<i32, Vec<Box<dyn Orch>>>,
    /// Running flag
    running: bool,
    /// Set once every Orch has seen `on_shutdown()`
    shut_down: bool,
    /// Cuts the loop's sleep short when new work is queued
    wake: Arc<Notify>,
}

impl OrchDaemon {
    /// Creates a new OrchDaemon with the given configuration.
    pub fn new(config: OrchDaemonConfig) -> Self {
        Self {
            config,
            orchs: BTreeMap::new(),
            running: false,
            shut_down: false,
            wake: Arc::new(Notify::new()),
        }
    }

    pub fn config(&self) -> &OrchDaemonConfig {
        &self.config
    }

    pub fn orch_count(&self) -> usize {
        self.orchs.values().map(Vec::len).sum()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Handle producers signal after queueing work for an Orch.
    ///
    /// Attach it with `ConsumerSender::with_waker` or
    /// `NotificationSender::with_waker`.
    pub fn waker(&self) -> Arc<Notify> {
        self.wake.clone()
    }

    /// Registers an Orch with the daemon.
    ///
    /// Orchs are ordered by priority (lower = higher priority).
    pub fn register_orch(&mut self, orch: Box<dyn Orch>) {
        let priority = orch.priority();
        let orch_name = orch.name().to_string();
        info!("Registering {} with priority {}", orch_name, priority);

        audit_log!(AuditRecord::new(
            AuditCategory::ResourceCreate,
            "OrchDaemon",
            format!("register_orch: {}", orch_name),
        )
        .with_outcome(AuditOutcome::Success)
        .with_object_id(&orch_name)
        .with_object_type("orch_module")
        .with_details(serde_json::json!({
            "priority": priority,
        })));

        self.orchs.entry(priority).or_default().push(orch);
    }

    /// Prepares the daemon for `run()`.
    pub async fn init(&mut self) -> bool {
        info!("Initializing OrchDaemon with {} orchs", self.orch_count());

        audit_log!(AuditRecord::new(
            AuditCategory::SystemLifecycle,
            "OrchDaemon",
            "daemon_initialization",
        )
        .with_outcome(AuditOutcome::Success)
        .with_details(serde_json::json!({
            "orch_count": self.orch_count(),
            "priorities": self.orchs.keys().collect::<Vec<_>>(),
        })));

        true
    }

    /// Runs `do_task()` on every Orch with pending work, in priority order.
    ///
    /// Returns the number of Orchs that ran.
    pub async fn process_tasks(&mut self) -> usize {
        let mut processed = 0;
        for orch in self.orchs.values_mut().flatten() {
            if orch.has_pending_tasks() {
                debug!("Processing tasks for {}", orch.name());
                orch.do_task().await;
                processed += 1;
            }
        }
        processed
    }

    /// Calls `on_timer()` on every Orch whose deadline is at or before `now`.
    ///
    /// Returns the number of Orchs fired.
    pub fn fire_timers(&mut self, now: Instant) -> usize {
        let mut fired = 0;
        for orch in self.orchs.values_mut().flatten() {
            if orch.next_timer_deadline().is_some_and(|deadline| deadline <= now) {
                orch.on_timer(now);
                fired += 1;
            }
        }
        fired
    }

    /// Earliest Orch timer deadline, bounded by the heartbeat.
    pub fn next_wakeup(&self, now: Instant) -> Instant {
        let heartbeat =
            now.checked_add(Duration::from_millis(self.config.heartbeat_interval_ms.max(1)));
        self.orchs
            .values()
            .flatten()
            .filter_map(|orch| orch.next_timer_deadline())
            .chain(heartbeat)
            .min()
            .unwrap_or(now)
    }

    /// Runs the main event loop until `shutdown` completes, then shuts every
    /// Orch down.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!("Starting OrchDaemon event loop");
        self.running = true;

        audit_log!(AuditRecord::new(
            AuditCategory::AdminAction,
            "OrchDaemon",
            "event_loop_started",
        )
        .with_outcome(AuditOutcome::Success)
        .with_details(serde_json::json!({
            "heartbeat_interval_ms": self.config.heartbeat_interval_ms,
            "orch_count": self.orch_count(),
        })));

        tokio::pin!(shutdown);
        let wake = self.wake.clone();

        while self.running {
            self.process_tasks().await;
            self.fire_timers(Instant::now());

            let wakeup = tokio::time::Instant::from_std(self.next_wakeup(Instant::now()));
            tokio::select! {
                _ = &mut shutdown => self.stop(),
                _ = tokio::time::sleep_until(wakeup) => {}
                _ = wake.notified() => debug!("Woken by queued work"),
            }
        }

        info!("OrchDaemon event loop stopped");
        self.shutdown_orchs();
    }

    /// Stops the event loop after the current iteration.
    pub fn stop(&mut self) {
        info!("Stopping OrchDaemon");

        audit_log!(AuditRecord::new(
            AuditCategory::AdminAction,
            "OrchDaemon",
            "stop_requested",
        )
        .with_outcome(AuditOutcome::Success));

        self.running = false;
    }

    /// Calls `on_shutdown()` on every Orch, in priority order. Runs once.
    pub fn shutdown_orchs(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        for orch in self.orchs.values_mut().flatten() {
            debug!("Shutting down {}", orch.name());
            orch.on_shutdown();
        }

        audit_log!(AuditRecord::new(
            AuditCategory::SystemLifecycle,
            "OrchDaemon",
            "daemon_shutdown",
        )
        .with_outcome(AuditOutcome::Success)
        .with_details(serde_json::json!({
            "orch_count": self.orch_count(),
        })));
    }

    /// Dumps state for debugging.
    pub fn dump(&self) -> Vec<String> {
        let mut lines = Vec::new();
        lines.push(format!("OrchDaemon running: {}", self.running));

        for (priority, orchs) in &self.orchs {
            for orch in orchs {
                lines.push(format!(
                    "  [{:3}] {} - {} pending",
                    priority,
                    orch.name(),
                    orch.dump_pending_tasks().len()
                ));
            }
        }

        lines
    }
}
