//! Raw records exchanged with sources and targets.
//!
//! Collaborators speak JSON. A record is decoded into an entity only after
//! every model invariant holds and any identifier it carries matches the
//! identifier derived from its content.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::hash::Hash;

use crate::error::{DeserializationError, ModelError};
use crate::filter::PacketFilter;
use crate::owner::Owner;
use crate::peer::NetworkPeer;
use crate::rule::Rule;
use crate::service::{port_from_raw, NetworkService, Protocol};
use crate::types::{EntityKind, Identified};

/// Result type for record decoding.
pub type DecodeResult<T> = std::result::Result<T, DeserializationError>;

/// Raw peer: `{"ip_low": "...", "ip_high": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    pub ip_low: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_high: Option<String>,
}

/// Raw service. Ports are wide integers so out-of-range values reach
/// validation instead of failing the parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_low: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_high: Option<i64>,
}

/// Raw packet filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub services: Vec<ServiceRecord>,
}

/// Raw rule. `owners` may be missing or `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub sources: Vec<PeerRecord>,
    pub destinations: Vec<PeerRecord>,
    pub packet_filter: FilterRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owners: Option<Vec<String>>,
}

impl PeerRecord {
    pub fn to_peer(&self) -> Result<NetworkPeer, ModelError> {
        NetworkPeer::parse(&self.ip_low, self.ip_high.as_deref())
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("ip_low".into(), Value::from(self.ip_low.as_str()));
        if let Some(high) = &self.ip_high {
            map.insert("ip_high".into(), Value::from(high.as_str()));
        }
        Value::Object(map)
    }
}

impl ServiceRecord {
    pub fn to_service(&self) -> Result<NetworkService, ModelError> {
        let protocol: Protocol = self.protocol.parse()?;
        let port_low = self.port_low.map(port_from_raw).transpose()?;
        let port_high = self.port_high.map(port_from_raw).transpose()?;
        NetworkService::new(protocol, port_low, port_high)
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("protocol".into(), Value::from(self.protocol.as_str()));
        if let Some(low) = self.port_low {
            map.insert("port_low".into(), Value::from(low));
        }
        if let Some(high) = self.port_high {
            map.insert("port_high".into(), Value::from(high));
        }
        Value::Object(map)
    }
}

impl FilterRecord {
    /// Validate into a filter, checking any carried identifier.
    pub fn decode(&self) -> DecodeResult<PacketFilter> {
        let kind = EntityKind::PacketFilter;
        let services = self
            .services
            .iter()
            .map(ServiceRecord::to_service)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| DeserializationError::Invalid { kind, source })?;
        let filter =
            PacketFilter::new(services).map_err(|source| DeserializationError::Invalid { kind, source })?;
        check_identifier(kind, self.identifier.as_deref(), &filter)?;
        Ok(filter)
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(identifier) = &self.identifier {
            map.insert("identifier".into(), Value::from(identifier.as_str()));
        }
        map.insert(
            "services".into(),
            Value::Array(self.services.iter().map(ServiceRecord::to_value).collect()),
        );
        Value::Object(map)
    }
}

impl RuleRecord {
    /// Validate into a rule, checking the rule and filter identifiers.
    pub fn decode(&self) -> DecodeResult<Rule> {
        let kind = EntityKind::Rule;
        let invalid = |source| DeserializationError::Invalid { kind, source };

        let sources = decode_peers(&self.sources).map_err(invalid)?;
        let destinations = decode_peers(&self.destinations).map_err(invalid)?;
        let packet_filter = self.packet_filter.decode()?;
        let owners = self
            .owners
            .iter()
            .flatten()
            .map(|tag| Owner::new(tag.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;

        let rule = Rule::new(sources, destinations, packet_filter, owners).map_err(invalid)?;
        check_identifier(kind, self.identifier.as_deref(), &rule)?;
        Ok(rule)
    }

    /// JSON object with identifiers first and absent fields omitted.
    pub fn to_value(&self) -> Value {
        let peers = |peers: &[PeerRecord]| Value::Array(peers.iter().map(PeerRecord::to_value).collect());

        let mut map = Map::new();
        if let Some(identifier) = &self.identifier {
            map.insert("identifier".into(), Value::from(identifier.as_str()));
        }
        map.insert("sources".into(), peers(&self.sources));
        map.insert("destinations".into(), peers(&self.destinations));
        map.insert("packet_filter".into(), self.packet_filter.to_value());
        if let Some(owners) = &self.owners {
            map.insert(
                "owners".into(),
                Value::Array(owners.iter().map(|o| Value::from(o.as_str())).collect()),
            );
        }
        Value::Object(map)
    }
}

fn decode_peers(records: &[PeerRecord]) -> Result<Vec<NetworkPeer>, ModelError> {
    records.iter().map(PeerRecord::to_peer).collect()
}

fn check_identifier<T: Identified>(kind: EntityKind, found: Option<&str>, entity: &T) -> DecodeResult<()> {
    match found {
        Some(found) if entity.identifier() != found => Err(DeserializationError::IdentifierMismatch {
            kind,
            found: found.to_string(),
            expected: entity.identifier().clone(),
        }),
        _ => Ok(()),
    }
}

impl From<&NetworkPeer> for PeerRecord {
    fn from(peer: &NetworkPeer) -> Self {
        Self {
            ip_low: peer.ip_low(),
            ip_high: peer.ip_high(),
        }
    }
}

impl From<&NetworkService> for ServiceRecord {
    fn from(service: &NetworkService) -> Self {
        Self {
            protocol: service.protocol().as_str().to_string(),
            port_low: service.port_low().map(i64::from),
            port_high: service.port_high().map(i64::from),
        }
    }
}

impl From<&PacketFilter> for FilterRecord {
    fn from(filter: &PacketFilter) -> Self {
        Self {
            identifier: Some(filter.identifier().to_string()),
            services: filter.services().iter().map(ServiceRecord::from).collect(),
        }
    }
}

impl From<&Rule> for RuleRecord {
    fn from(rule: &Rule) -> Self {
        Self {
            identifier: Some(rule.identifier().to_string()),
            sources: rule.sources().iter().map(PeerRecord::from).collect(),
            destinations: rule.destinations().iter().map(PeerRecord::from).collect(),
            packet_filter: FilterRecord::from(rule.packet_filter()),
            owners: Some(rule.owners().iter().map(|o| o.as_str().to_string()).collect()),
        }
    }
}

impl Rule {
    /// Encode as a raw record value.
    pub fn to_value(&self) -> Value {
        RuleRecord::from(self).to_value()
    }
}

impl PacketFilter {
    /// Encode as a raw record value.
    pub fn to_value(&self) -> Value {
        FilterRecord::from(self).to_value()
    }
}

impl Owner {
    /// Encode as a raw record value.
    pub fn to_value(&self) -> Value {
        Value::from(self.as_str())
    }
}

fn parse_record<T: serde::de::DeserializeOwned>(kind: EntityKind, value: Value) -> DecodeResult<T> {
    serde_json::from_value(value).map_err(|e| DeserializationError::Malformed {
        kind,
        reason: e.to_string(),
    })
}

/// Decode one raw rule.
pub fn decode_rule(value: Value) -> DecodeResult<Rule> {
    parse_record::<RuleRecord>(EntityKind::Rule, value)?.decode()
}

/// Decode one raw packet filter.
pub fn decode_filter(value: Value) -> DecodeResult<PacketFilter> {
    parse_record::<FilterRecord>(EntityKind::PacketFilter, value)?.decode()
}

/// Decode one raw owner tag.
pub fn decode_owner(value: Value) -> DecodeResult<Owner> {
    let kind = EntityKind::Owner;
    match value {
        Value::String(tag) => Owner::new(tag).map_err(|source| DeserializationError::Invalid { kind, source }),
        other => Err(DeserializationError::Malformed {
            kind,
            reason: format!("expected a string, found {}", other),
        }),
    }
}

fn decode_all<T: Eq + Hash>(
    values: impl IntoIterator<Item = Value>,
    decode: fn(Value) -> DecodeResult<T>,
) -> DecodeResult<HashSet<T>> {
    values.into_iter().map(decode).collect()
}

/// Decode raw rules into a set; the first failure aborts.
pub fn decode_rules(values: impl IntoIterator<Item = Value>) -> DecodeResult<HashSet<Rule>> {
    decode_all(values, decode_rule)
}

/// Decode raw packet filters into a set; the first failure aborts.
pub fn decode_filters(values: impl IntoIterator<Item = Value>) -> DecodeResult<HashSet<PacketFilter>> {
    decode_all(values, decode_filter)
}

/// Decode raw owner tags into a set; the first failure aborts.
pub fn decode_owners(values: impl IntoIterator<Item = Value>) -> DecodeResult<HashSet<Owner>> {
    decode_all(values, decode_owner)
}
