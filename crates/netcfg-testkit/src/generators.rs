//! Proptest generators for property-based testing.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use proptest::prelude::*;

use netcfg_core::{NetworkPeer, NetworkService, Owner, PacketFilter, Protocol, Rule};

/// Generate an IPv4 address.
pub fn address() -> impl Strategy<Value = Ipv4Addr> {
    any::<u32>().prop_map(Ipv4Addr::from)
}

/// Generate a network in canonical form.
pub fn network() -> impl Strategy<Value = Ipv4Net> {
    (any::<u32>(), 0u8..=32).prop_filter_map("prefix length", |(bits, len)| {
        Ipv4Net::new(Ipv4Addr::from(bits), len).ok().map(|net| net.trunc())
    })
}

/// Generate a peer of any shape.
pub fn peer() -> impl Strategy<Value = NetworkPeer> {
    prop_oneof![
        address().prop_map(NetworkPeer::Address),
        network().prop_map(NetworkPeer::Network),
        (address(), address()).prop_filter_map("distinct ends", |(a, b)| {
            NetworkPeer::range(a.min(b), a.max(b)).ok()
        }),
    ]
}

/// Generate a protocol.
pub fn protocol() -> impl Strategy<Value = Protocol> {
    prop_oneof![Just(Protocol::Tcp), Just(Protocol::Udp), Just(Protocol::Icmp)]
}

/// Generate a valid service.
pub fn service() -> impl Strategy<Value = NetworkService> {
    (protocol(), any::<u16>(), proptest::option::of(any::<u16>())).prop_filter_map(
        "valid ports",
        |(protocol, low, high)| NetworkService::new(protocol, Some(low), high.map(|h| h.max(low))).ok(),
    )
}

/// Generate a filter of up to `max` services.
pub fn packet_filter(max: usize) -> impl Strategy<Value = PacketFilter> {
    prop::collection::vec(service(), 1..=max.max(1))
        .prop_filter_map("non-empty", |services| PacketFilter::new(services).ok())
}

/// Generate an owner tag.
pub fn owner() -> impl Strategy<Value = Owner> {
    "X-[a-z0-9]{1,8}".prop_filter_map("prefixed tag", |tag| Owner::new(tag).ok())
}

/// Generate a rule with small peer and service lists.
pub fn rule() -> impl Strategy<Value = Rule> {
    (
        prop::collection::vec(peer(), 1..4),
        prop::collection::vec(peer(), 1..4),
        packet_filter(3),
        prop::collection::vec(owner(), 0..3),
    )
        .prop_filter_map("valid rule", |(sources, destinations, filter, owners)| {
            Rule::new(sources, destinations, filter, owners).ok()
        })
}
