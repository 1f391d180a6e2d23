//! Canonical JSON text for content addressing.
//!
//! Identifiers are the SHA-1 of these strings, so the layout is fixed:
//! - compact JSON, no whitespace
//! - fields in insertion order (never alphabetical)
//! - absent ports and `ip_high` written as `null`
//! - filter services deduplicated and sorted by their own canonical text
//! - rule owners sorted, and the embedded filter carries its identifier
//!
//! Any change here changes every identifier a target already holds.

use serde_json::{json, Value};
use std::collections::BTreeSet;

use crate::filter::PacketFilter;
use crate::owner::Owner;
use crate::peer::NetworkPeer;
use crate::service::NetworkService;
use crate::types::Identified;

fn peer_value(peer: &NetworkPeer) -> Value {
    json!({
        "ip_low": peer.ip_low(),
        "ip_high": peer.ip_high(),
    })
}

fn service_value(service: &NetworkService) -> Value {
    json!({
        "protocol": service.protocol().as_str(),
        "port_low": service.port_low(),
        "port_high": service.port_high(),
    })
}

fn services_value(services: &[NetworkService]) -> Value {
    Value::Array(services.iter().map(service_value).collect())
}

/// Canonical text of one service, also its sort key inside a filter.
pub fn service_text(service: &NetworkService) -> String {
    service_value(service).to_string()
}

/// Canonical text hashed into a filter identifier.
///
/// `services` must already be deduplicated and sorted by [`service_text`].
pub fn filter_text(services: &[NetworkService]) -> String {
    json!({ "services": services_value(services) }).to_string()
}

/// Canonical text hashed into a rule identifier.
pub fn rule_text(
    sources: &[NetworkPeer],
    destinations: &[NetworkPeer],
    packet_filter: &PacketFilter,
    owners: &BTreeSet<Owner>,
) -> String {
    let owners: Vec<&str> = owners.iter().map(Owner::as_str).collect();
    json!({
        "sources": sources.iter().map(peer_value).collect::<Vec<_>>(),
        "destinations": destinations.iter().map(peer_value).collect::<Vec<_>>(),
        "packet_filter": {
            "services": services_value(packet_filter.services()),
            "identifier": packet_filter.identifier().as_str(),
        },
        "owners": owners,
    })
    .to_string()
}
