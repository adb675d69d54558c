//! Port struct and related types.

use sonic_sai::PortOid;
use std::fmt;

/// Port type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PortType {
    /// Physical port (front-panel port).
    #[default]
    Phy,
    /// CPU port (for control plane traffic).
    Cpu,
    /// VLAN port (SVI - Switch Virtual Interface).
    Vlan,
    /// LAG (Link Aggregation Group) port.
    Lag,
    /// Subport (VLAN subinterface).
    Subport,
    /// System port (for VOQ/distributed systems).
    System,
    Unknown,
}

impl PortType {
    /// True for ports backed by ASIC front-panel lanes.
    pub fn is_physical(self) -> bool {
        self == Self::Phy
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Phy => write!(f, "PHY"),
            Self::Cpu => write!(f, "CPU"),
            Self::Vlan => write!(f, "VLAN"),
            Self::Lag => write!(f, "LAG"),
            Self::Subport => write!(f, "SUBPORT"),
            Self::System => write!(f, "SYSTEM"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl std::str::FromStr for PortType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PHY" => Ok(Self::Phy),
            "CPU" => Ok(Self::Cpu),
            "VLAN" => Ok(Self::Vlan),
            "LAG" => Ok(Self::Lag),
            "SUBPORT" => Ok(Self::Subport),
            "SYSTEM" => Ok(Self::System),
            _ => Err(format!("Unknown port type: {}", s)),
        }
    }
}

/// A port as seen by consumers of the port registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    /// Port alias (e.g., "Ethernet0", "PortChannel0001").
    pub alias: String,
    pub port_type: PortType,
    /// SAI port object ID.
    pub port_id: PortOid,
}

impl Port {
    pub fn new(alias: impl Into<String>, port_type: PortType, port_id: PortOid) -> Self {
        Self {
            alias: alias.into(),
            port_type,
            port_id,
        }
    }

    /// Creates a physical port.
    pub fn phy(alias: impl Into<String>, port_id: PortOid) -> Self {
        Self::new(alias, PortType::Phy, port_id)
    }

    pub fn is_physical(&self) -> bool {
        self.port_type.is_physical()
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.alias, self.port_type, self.port_id)
    }
}
