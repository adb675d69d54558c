//! SONiC Orchagent - TX error monitoring daemon
//!
//! Hosts ErrorMonitorOrch, which watches per-port TX error counters and
//! publishes a per-port health verdict to STATE_DB.
//!
//! # Architecture
//!
//! The orchagent follows an event-driven architecture:
//!
//! ```text
//! [CONFIG_DB] ──┐
//!               ├──> [OrchDaemon] ──> [ErrorMonitorOrch] ──> [SAI port stats]
//! [clear chan] ─┘                            │
//!                                            ↓
//!                                       [STATE_DB]
//! ```
//!
//! # Key Components
//!
//! - [`daemon::OrchDaemon`]: Main event loop and Orch coordination
//! - [`error_monitor::ErrorMonitorOrch`]: Per-port TX error threshold monitor
//! - [`ports`]: Port lookup and port-change subscriptions
//! - [`audit`]: Structured audit records and JSON logging

pub mod audit;
pub mod daemon;
pub mod error_monitor;
pub mod ports;

// ============================================================================
// Re-exports
// ============================================================================

pub use sonic_orch_common::{
    Consumer, ConsumerConfig, KeyOpFieldsValues, MemoryTable, Notification, Operation, Orch,
    SyncMap, Table,
};
pub use sonic_sai::{PortOid, PortStat, PortStatsApi, SaiError, SaiResult, SwitchOid};

pub use error_monitor::{
    ErrorMonitorOrch, ErrorMonitorOrchConfig, ErrorMonitorOrchError, ErrorMonitorOrchStats,
    MonitorContext, TxErrorStatus,
};
pub use ports::{LocalPortRegistry, Port, PortRegistry, PortType};
