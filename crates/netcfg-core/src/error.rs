//! Error types for netcfg core.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use thiserror::Error;

use crate::service::Protocol;
use crate::types::{EntityKind, Identifier};

/// Violations of the entity invariants, raised while constructing values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("unknown protocol {0:?}, expected tcp, udp or icmp")]
    UnknownProtocol(String),

    #[error("{0} requires a port number")]
    MissingPort(Protocol),

    #[error("port {0} is outside 0..=65535")]
    PortOutOfRange(i64),

    #[error("port_high {high} cannot be lower than port_low {low}")]
    ReversedPortRange { low: u16, high: u16 },

    #[error("port 0 cannot be used in ranges")]
    ZeroPortRange,

    #[error("invalid IPv4 address {0:?}")]
    InvalidAddress(String),

    #[error("invalid IPv4 network {0:?}")]
    InvalidNetwork(String),

    #[error("network {0} has host bits set")]
    NetworkHostBits(Ipv4Net),

    #[error("range is not possible when ip_low is network address {0}")]
    RangeFromNetwork(Ipv4Net),

    #[error("ip_high {high} cannot be lower than ip_low {low}")]
    ReversedAddressRange { low: Ipv4Addr, high: Ipv4Addr },

    #[error("packet filter requires at least one service")]
    EmptyServices,

    #[error("rule requires at least one source")]
    EmptySources,

    #[error("rule requires at least one destination")]
    EmptyDestinations,

    #[error("owner {0:?} must start with \"X-\"")]
    OwnerPrefix(String),
}

/// Failure to turn a raw record into an entity.
///
/// Always fatal: retrying cannot fix malformed data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeserializationError {
    /// The record does not have the expected shape.
    #[error("malformed {kind} record: {reason}")]
    Malformed { kind: EntityKind, reason: String },

    /// The record is well formed but violates an entity invariant.
    #[error("invalid {kind}: {source}")]
    Invalid {
        kind: EntityKind,
        #[source]
        source: ModelError,
    },

    /// The record carries an identifier that does not match its content.
    #[error("found incorrect {kind} identifier {found}, expected {expected}")]
    IdentifierMismatch {
        kind: EntityKind,
        found: String,
        expected: Identifier,
    },
}

impl DeserializationError {
    /// The entity kind whose record failed to decode.
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Malformed { kind, .. }
            | Self::Invalid { kind, .. }
            | Self::IdentifierMismatch { kind, .. } => *kind,
        }
    }
}

/// Result type for model construction.
pub type Result<T> = std::result::Result<T, ModelError>;
