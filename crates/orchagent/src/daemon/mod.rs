//! Orchestration daemon: owns the registered Orchs and drives their tasks
//! and timers from a single event loop.

mod orchdaemon;

pub use orchdaemon::{OrchDaemon, OrchDaemonConfig};
