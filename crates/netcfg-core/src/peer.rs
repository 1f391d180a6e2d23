//! Network peers: a single address, a CIDR network, or an address range.

use ipnet::Ipv4Net;
use std::fmt;
use std::net::Ipv4Addr;

use crate::error::{ModelError, Result};

/// One side of a rule's match.
///
/// The three shapes are mutually exclusive. A range whose ends are equal is
/// stored as a single address, and a network never has host bits set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkPeer {
    /// A single IPv4 address.
    Address(Ipv4Addr),
    /// A CIDR network.
    Network(Ipv4Net),
    /// An inclusive address range with `low < high`.
    Range { low: Ipv4Addr, high: Ipv4Addr },
}

impl NetworkPeer {
    /// A single address.
    pub fn address(addr: Ipv4Addr) -> Self {
        Self::Address(addr)
    }

    /// A network; rejects networks with host bits set.
    pub fn network(net: Ipv4Net) -> Result<Self> {
        if net.addr() != net.network() {
            return Err(ModelError::NetworkHostBits(net));
        }
        Ok(Self::Network(net))
    }

    /// An inclusive range; collapses to a single address when `low == high`.
    pub fn range(low: Ipv4Addr, high: Ipv4Addr) -> Result<Self> {
        if high < low {
            return Err(ModelError::ReversedAddressRange { low, high });
        }
        if high == low {
            return Ok(Self::Address(low));
        }
        Ok(Self::Range { low, high })
    }

    /// Parse the textual `ip_low`/`ip_high` pair used in records.
    ///
    /// `ip_low` is a network when it contains `/`; a network cannot be
    /// combined with `ip_high`.
    pub fn parse(ip_low: &str, ip_high: Option<&str>) -> Result<Self> {
        if ip_low.contains('/') {
            let net: Ipv4Net = ip_low
                .parse()
                .map_err(|_| ModelError::InvalidNetwork(ip_low.to_string()))?;
            if ip_high.is_some() {
                return Err(ModelError::RangeFromNetwork(net));
            }
            return Self::network(net);
        }

        let low = parse_address(ip_low)?;
        match ip_high {
            None => Ok(Self::Address(low)),
            Some(high) => Self::range(low, parse_address(high)?),
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, Self::Address(_))
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Self::Range { .. })
    }

    /// Text of the `ip_low` field: the address, the network in CIDR form, or
    /// the range start.
    pub fn ip_low(&self) -> String {
        match self {
            Self::Address(addr) => addr.to_string(),
            Self::Network(net) => net.to_string(),
            Self::Range { low, .. } => low.to_string(),
        }
    }

    /// Text of the `ip_high` field, present only for ranges.
    pub fn ip_high(&self) -> Option<String> {
        match self {
            Self::Range { high, .. } => Some(high.to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for NetworkPeer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(addr) => write!(f, "{}", addr),
            Self::Network(net) => write!(f, "{}", net),
            Self::Range { low, high } => write!(f, "{}-{}", low, high),
        }
    }
}

impl From<Ipv4Addr> for NetworkPeer {
    fn from(addr: Ipv4Addr) -> Self {
        Self::Address(addr)
    }
}

fn parse_address(text: &str) -> Result<Ipv4Addr> {
    text.parse()
        .map_err(|_| ModelError::InvalidAddress(text.to_string()))
}
