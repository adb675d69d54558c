//! SAI port statistics API.
//!
//! Counters are read with `sai_port_api_t::get_port_stats`. Values are
//! cumulative since the counter was last cleared on the ASIC.

use std::fmt;

use log::debug;

use crate::error::{SaiError, SaiResult};
use crate::types::{PortOid, SwitchOid};

/// Port counters, numbered as `sai_port_stat_t`.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortStat {
    IfInOctets = 0,
    IfInUcastPkts = 1,
    IfInErrors = 4,
    IfOutOctets = 9,
    IfOutUcastPkts = 10,
    IfOutDiscards = 13,
    /// Frames that could not be transmitted because of errors.
    IfOutErrors = 14,
}

impl PortStat {
    pub fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn sai_name(self) -> &'static str {
        match self {
            PortStat::IfInOctets => "SAI_PORT_STAT_IF_IN_OCTETS",
            PortStat::IfInUcastPkts => "SAI_PORT_STAT_IF_IN_UCAST_PKTS",
            PortStat::IfInErrors => "SAI_PORT_STAT_IF_IN_ERRORS",
            PortStat::IfOutOctets => "SAI_PORT_STAT_IF_OUT_OCTETS",
            PortStat::IfOutUcastPkts => "SAI_PORT_STAT_IF_OUT_UCAST_PKTS",
            PortStat::IfOutDiscards => "SAI_PORT_STAT_IF_OUT_DISCARDS",
            PortStat::IfOutErrors => "SAI_PORT_STAT_IF_OUT_ERRORS",
        }
    }
}

impl fmt::Display for PortStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sai_name())
    }
}

/// Synchronous port counter queries.
///
/// Implemented by [`PortApi`] for the ASIC and by mocks in tests.
pub trait PortStatsApi: Send + Sync {
    /// Reads `counters` for `port`, returning values in the same order.
    fn get_port_stats(&self, port: PortOid, counters: &[PortStat]) -> SaiResult<Vec<u64>>;

    /// Reads a single counter.
    fn get_port_stat(&self, port: PortOid, counter: PortStat) -> SaiResult<u64> {
        let values = self.get_port_stats(port, &[counter])?;
        values
            .first()
            .copied()
            .ok_or_else(|| SaiError::not_found(format!("{} on port {}", counter, port)))
    }
}

/// Safe wrapper for the SAI port API.
///
/// Holds the raw `sai_port_api_t` pointer once the FFI layer is linked in.
pub struct PortApi {
    switch_id: SwitchOid,
}

impl PortApi {
    pub fn new(switch_id: SwitchOid) -> Self {
        Self { switch_id }
    }

    pub fn switch_id(&self) -> SwitchOid {
        self.switch_id
    }
}

impl PortStatsApi for PortApi {
    fn get_port_stats(&self, port: PortOid, counters: &[PortStat]) -> SaiResult<Vec<u64>> {
        if port.is_null() {
            return Err(SaiError::invalid_parameter("Port OID is null"));
        }
        if counters.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "get_port_stats on switch {} port {} for {} counters",
            self.switch_id,
            port,
            counters.len()
        );

        Err(SaiError::not_supported("FFI not enabled"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct FixedStats(u64);

    impl PortStatsApi for FixedStats {
        fn get_port_stats(&self, _port: PortOid, counters: &[PortStat]) -> SaiResult<Vec<u64>> {
            Ok(counters.iter().map(|_| self.0).collect())
        }
    }

    #[test]
    fn test_port_stat_names() {
        assert_eq!(PortStat::IfOutErrors.as_raw(), 14);
        assert_eq!(PortStat::IfOutErrors.to_string(), "SAI_PORT_STAT_IF_OUT_ERRORS");
    }

    #[test]
    fn test_get_port_stat_default() {
        let port = PortOid::from_raw(0x1000000000001).unwrap();
        assert_eq!(FixedStats(42).get_port_stat(port, PortStat::IfOutErrors), Ok(42));
    }

    #[test]
    fn test_port_api_rejects_null_port() {
        let api = PortApi::new(SwitchOid::from_raw(0x21000000000000).unwrap());
        let err = api
            .get_port_stat(PortOid::NULL, PortStat::IfOutErrors)
            .unwrap_err();
        assert!(matches!(err, SaiError::InvalidParameter { .. }));
    }

    #[test]
    fn test_port_api_without_ffi() {
        let api = PortApi::new(SwitchOid::from_raw(0x21000000000000).unwrap());
        let port = PortOid::from_raw(0x1000000000001).unwrap();

        assert_eq!(api.get_port_stats(port, &[]), Ok(vec![]));
        assert!(matches!(
            api.get_port_stat(port, PortStat::IfOutErrors),
            Err(SaiError::NotSupported { .. })
        ));
    }
}
