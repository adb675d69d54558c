//! Rust-side view of the SAI (Switch Abstraction Interface) used by the
//! orchestration agents.
//!
//! - [`types`]: type-safe object IDs (`PortOid`, `SwitchOid`)
//! - [`error`]: SAI status codes and the [`SaiError`] type
//! - [`api`]: API wrappers, currently the port statistics API
//!
//! # Example
//!
//! ```ignore
//! use sonic_sai::{PortOid, PortStat, PortStatsApi, SaiResult};
//!
//! fn tx_errors(api: &dyn PortStatsApi, port: PortOid) -> SaiResult<u64> {
//!     api.get_port_stat(port, PortStat::IfOutErrors)
//! }
//! ```

pub mod api;
pub mod error;
pub mod types;

pub use api::{PortApi, PortStat, PortStatsApi};
pub use error::{SaiError, SaiResult, SaiStatus};
pub use types::{PortKind, PortOid, RawSaiObjectId, SaiObjectId, SaiObjectKind, SwitchKind, SwitchOid};
