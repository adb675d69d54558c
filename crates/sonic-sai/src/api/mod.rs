//! Safe wrappers for SAI API functions.
//!
//! Wrappers take typed object IDs and convert SAI status codes into
//! [`SaiResult`](crate::SaiResult).

pub mod port;

pub use port::{PortApi, PortStat, PortStatsApi};
