//! Network services: a protocol plus an optional port or port range.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ModelError, Result};

/// Transport protocol matched by a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
}

impl Protocol {
    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Icmp => "icmp",
        }
    }

    /// Whether services of this protocol carry ports.
    pub fn uses_ports(self) -> bool {
        !matches!(self, Self::Icmp)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            "icmp" => Ok(Self::Icmp),
            other => Err(ModelError::UnknownProtocol(other.to_string())),
        }
    }
}

/// A protocol with an optional port or inclusive port range.
///
/// Invariants, enforced by [`NetworkService::new`]:
/// - icmp never carries ports
/// - tcp and udp always carry `port_low`
/// - `port_high` is `None` for a single port, otherwise strictly above `port_low`
/// - a range never starts at port 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkService {
    protocol: Protocol,
    port_low: Option<u16>,
    port_high: Option<u16>,
}

impl NetworkService {
    /// Build a service, normalizing and validating the ports.
    ///
    /// Ports given for icmp are dropped. A `port_high` equal to `port_low`
    /// collapses to a single port.
    pub fn new(protocol: Protocol, port_low: Option<u16>, port_high: Option<u16>) -> Result<Self> {
        if !protocol.uses_ports() {
            return Ok(Self::icmp());
        }

        let low = port_low.ok_or(ModelError::MissingPort(protocol))?;
        let high = match port_high {
            None => None,
            Some(high) if high == low => None,
            Some(high) if high < low => return Err(ModelError::ReversedPortRange { low, high }),
            Some(_) if low == 0 => return Err(ModelError::ZeroPortRange),
            Some(high) => Some(high),
        };

        Ok(Self {
            protocol,
            port_low: Some(low),
            port_high: high,
        })
    }

    /// The icmp service.
    pub fn icmp() -> Self {
        Self {
            protocol: Protocol::Icmp,
            port_low: None,
            port_high: None,
        }
    }

    /// A single tcp port.
    pub fn tcp(port: u16) -> Self {
        Self {
            protocol: Protocol::Tcp,
            port_low: Some(port),
            port_high: None,
        }
    }

    /// A single udp port.
    pub fn udp(port: u16) -> Self {
        Self {
            protocol: Protocol::Udp,
            port_low: Some(port),
            port_high: None,
        }
    }

    /// An inclusive tcp port range.
    pub fn tcp_range(low: u16, high: u16) -> Result<Self> {
        Self::new(Protocol::Tcp, Some(low), Some(high))
    }

    /// An inclusive udp port range.
    pub fn udp_range(low: u16, high: u16) -> Result<Self> {
        Self::new(Protocol::Udp, Some(low), Some(high))
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn port_low(&self) -> Option<u16> {
        self.port_low
    }

    pub fn port_high(&self) -> Option<u16> {
        self.port_high
    }

    /// Whether this service spans more than one port.
    pub fn is_range(&self) -> bool {
        self.port_high.is_some()
    }
}

impl fmt::Display for NetworkService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.port_low, self.port_high) {
            (Some(low), Some(high)) => write!(f, "{}/{}-{}", self.protocol, low, high),
            (Some(low), None) => write!(f, "{}/{}", self.protocol, low),
            _ => write!(f, "{}", self.protocol),
        }
    }
}

/// Convert a raw port number, rejecting values outside `0..=65535`.
pub(crate) fn port_from_raw(value: i64) -> Result<u16> {
    u16::try_from(value).map_err(|_| ModelError::PortOutOfRange(value))
}
