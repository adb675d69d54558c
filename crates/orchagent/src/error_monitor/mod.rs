//! Per-port TX error monitor.
//!
//! ErrorMonitorOrch watches the cumulative `IF_OUT_ERRORS` counter of every
//! enabled physical port. Each poll compares the errors accumulated since the
//! previous poll against the port's threshold and publishes the verdict.
//!
//! ```text
//! CONFIG_DB ERROR_MONITOR ──Consumer──┐
//! CLEAR_ERROR_MONITOR ─Notification───┤
//! PortRegistry ──PortSubscription─────┼──> ErrorMonitorOrch ──> STATE_DB ERROR_MONITOR_TABLE
//! SelectableTimer ──on_timer──────────┘          │
//!                                                └── PortStatsApi (IF_OUT_ERRORS)
//! ```
//!
//! # Config table
//!
//! Keys are `ERROR_MONITOR<sep><port>`; fields:
//!
//! | Field                | Value               | Scope    |
//! |----------------------|---------------------|----------|
//! | `tx_error_threshold` | unsigned integer    | per port |
//! | `tx_error_status`    | `enable`/`disable`  | per port |
//! | `poll_interval`      | seconds, 0 = stop   | global   |
//!
//! # State table
//!
//! One row per enabled port with `tx_error_status` (`OK` or `Not OK`) and
//! `tx_error` (the delta seen by the last poll).
//!
//! Every event is dropped until the port registry reports all ports ready.

mod context;
mod orch;
mod types;

pub use context::ContextStore;
pub use orch::{
    ErrorMonitorOrch, ErrorMonitorOrchConfig, ErrorMonitorOrchError, ErrorMonitorOrchStats,
};
pub use types::{
    parse_config_key, ClearTarget, ConfigField, MonitorAdminStatus, MonitorContext,
    TxErrorStatus, CLEAR_ALL_PORTS, CLEAR_ERROR_MONITOR_CHANNEL, CLEAR_OP_TX_ERROR_STATUS,
    DEFAULT_KEY_SEPARATOR, ERROR_MONITOR_CONFIG_TABLE, ERROR_MONITOR_STATE_TABLE,
    FIELD_POLL_INTERVAL, FIELD_TX_ERROR, FIELD_TX_ERROR_STATUS, FIELD_TX_ERROR_THRESHOLD,
};
