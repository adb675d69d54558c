//! Error monitor types and table schema.

use std::fmt;
use std::str::FromStr;

/// CONFIG_DB table holding per-port monitor configuration.
pub const ERROR_MONITOR_CONFIG_TABLE: &str = "ERROR_MONITOR";
/// STATE_DB table holding published per-port health.
pub const ERROR_MONITOR_STATE_TABLE: &str = "ERROR_MONITOR_TABLE";
/// Notification channel for clear requests.
pub const CLEAR_ERROR_MONITOR_CHANNEL: &str = "CLEAR_ERROR_MONITOR";
/// Separator between table name and port in config keys.
pub const DEFAULT_KEY_SEPARATOR: &str = ":";

/// Config field: per-interval error budget.
pub const FIELD_TX_ERROR_THRESHOLD: &str = "tx_error_threshold";
/// Config field (`enable`/`disable`) and state field (`OK`/`Not OK`).
pub const FIELD_TX_ERROR_STATUS: &str = "tx_error_status";
/// Config field: poll period in seconds, 0 stops polling.
pub const FIELD_POLL_INTERVAL: &str = "poll_interval";
/// State field: decimal error delta of the last poll.
pub const FIELD_TX_ERROR: &str = "tx_error";

/// The only clear operation understood on the clear channel.
pub const CLEAR_OP_TX_ERROR_STATUS: &str = "tx_error_status";
/// Clear payload meaning every tracked port.
pub const CLEAR_ALL_PORTS: &str = "ALL";

/// Configuration fields accepted on the config table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    TxErrorThreshold,
    TxErrorStatus,
    PollInterval,
}

impl FromStr for ConfigField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            FIELD_TX_ERROR_THRESHOLD => Ok(Self::TxErrorThreshold),
            FIELD_TX_ERROR_STATUS => Ok(Self::TxErrorStatus),
            FIELD_POLL_INTERVAL => Ok(Self::PollInterval),
            _ => Err(format!("Unsupported field: {}", s)),
        }
    }
}

/// Requested monitoring state for a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorAdminStatus {
    Enable,
    Disable,
}

impl FromStr for MonitorAdminStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enable" => Ok(Self::Enable),
            "disable" => Ok(Self::Disable),
            _ => Err(format!("Unknown monitor status: {}", s)),
        }
    }
}

impl fmt::Display for MonitorAdminStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enable => write!(f, "enable"),
            Self::Disable => write!(f, "disable"),
        }
    }
}

/// Published health of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxErrorStatus {
    Ok,
    NotOk,
}

impl TxErrorStatus {
    /// `NotOk` iff the delta exceeds the threshold.
    pub fn evaluate(delta: u64, threshold: u64) -> Self {
        if delta > threshold {
            Self::NotOk
        } else {
            Self::Ok
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NotOk => "Not OK",
        }
    }
}

impl fmt::Display for TxErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target of a clear request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearTarget {
    All,
    Port(String),
}

impl ClearTarget {
    pub fn from_payload(data: &str) -> Self {
        if data == CLEAR_ALL_PORTS {
            Self::All
        } else {
            Self::Port(data.to_string())
        }
    }
}

/// Per-port monitoring state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorContext {
    pub port_name: String,
    pub error_threshold: u64,
    /// Raw cumulative counter seen at the last poll.
    pub last_error_count: u64,
}

impl MonitorContext {
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            error_threshold: 0,
            last_error_count: 0,
        }
    }
}

/// Splits `<table><sep><port>` and returns the port.
///
/// Exactly two tokens are accepted.
pub fn parse_config_key<'a>(key: &'a str, separator: &str) -> Option<&'a str> {
    if separator.is_empty() {
        return None;
    }
    let mut tokens = key.split(separator);
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(_table), Some(port), None) => Some(port),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_config_key() {
        assert_eq!(parse_config_key("ERROR_MONITOR:Ethernet0", ":"), Some("Ethernet0"));
        assert_eq!(parse_config_key("ERROR_MONITOR|Ethernet0", "|"), Some("Ethernet0"));
        assert_eq!(parse_config_key("Ethernet0", ":"), None);
        assert_eq!(parse_config_key("ERROR_MONITOR:Ethernet0:extra", ":"), None);
        assert_eq!(parse_config_key("ERROR_MONITOR|Ethernet0", ":"), None);
        assert_eq!(parse_config_key("ERROR_MONITOR:Ethernet0", ""), None);
    }

    #[test]
    fn test_status_evaluation() {
        assert_eq!(TxErrorStatus::evaluate(3, 5), TxErrorStatus::Ok);
        assert_eq!(TxErrorStatus::evaluate(5, 5), TxErrorStatus::Ok);
        assert_eq!(TxErrorStatus::evaluate(6, 5), TxErrorStatus::NotOk);
        assert_eq!(TxErrorStatus::evaluate(1, 0), TxErrorStatus::NotOk);
        assert_eq!(TxErrorStatus::NotOk.to_string(), "Not OK");
    }

    #[test]
    fn test_field_and_status_parsing() {
        assert_eq!("poll_interval".parse::<ConfigField>(), Ok(ConfigField::PollInterval));
        assert!("tx_error".parse::<ConfigField>().is_err());
        assert_eq!("enable".parse::<MonitorAdminStatus>(), Ok(MonitorAdminStatus::Enable));
        assert!("Enable".parse::<MonitorAdminStatus>().is_err());
    }

    #[test]
    fn test_clear_target() {
        assert_eq!(ClearTarget::from_payload("ALL"), ClearTarget::All);
        assert_eq!(
            ClearTarget::from_payload("Ethernet0"),
            ClearTarget::Port("Ethernet0".to_string())
        );
    }

    #[test]
    fn test_context_defaults() {
        let ctx = MonitorContext::new("Ethernet0");
        assert_eq!(ctx.error_threshold, 0);
        assert_eq!(ctx.last_error_count, 0);
    }
}
