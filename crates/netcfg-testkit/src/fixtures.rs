//! Test fixtures and helpers.
//!
//! Two rules, `rule_a` and `rule_b`, share nothing: each has its own filter
//! and its own owner. Reconciling a device holding `rule_b` towards `rule_a`
//! exercises every step of the apply order exactly once.

use std::fs;
use std::io;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use netcfg_core::{NetworkPeer, NetworkService, Owner, PacketFilter, Rule};
use netcfg_endpoint::MemoryDevice;
use serde_json::Value;

/// Owner of [`rule_a`].
pub fn owner_1() -> Owner {
    owner("X-o1")
}

/// Owner of [`rule_b`].
pub fn owner_2() -> Owner {
    owner("X-o2")
}

/// Filter of [`rule_a`]: tcp/443.
pub fn filter_1() -> PacketFilter {
    filter([NetworkService::tcp(443)])
}

/// Filter of [`rule_b`]: udp/514 and udp/3000-3009.
pub fn filter_2() -> PacketFilter {
    filter([
        NetworkService::udp(514),
        NetworkService::udp_range(3000, 3009).expect("valid port range"),
    ])
}

/// 10.1.3.173 to 172.31.0.200 over [`filter_1`], owned by [`owner_1`].
pub fn rule_a() -> Rule {
    Rule::new(
        [NetworkPeer::address(Ipv4Addr::new(10, 1, 3, 173))],
        [NetworkPeer::address(Ipv4Addr::new(172, 31, 0, 200))],
        filter_1(),
        [owner_1()],
    )
    .expect("valid rule")
}

/// 10.0.0.0/8 to 192.168.1.1-192.168.1.100 over [`filter_2`], owned by [`owner_2`].
pub fn rule_b() -> Rule {
    Rule::new(
        [NetworkPeer::parse("10.0.0.0/8", None).expect("valid network")],
        [NetworkPeer::parse("192.168.1.1", Some("192.168.1.100")).expect("valid range")],
        filter_2(),
        [owner_2()],
    )
    .expect("valid rule")
}

/// Build an owner, panicking on an invalid tag.
pub fn owner(tag: &str) -> Owner {
    Owner::new(tag).expect("valid owner tag")
}

/// Build a filter, panicking on an empty service list.
pub fn filter(services: impl IntoIterator<Item = NetworkService>) -> PacketFilter {
    PacketFilter::new(services).expect("non-empty services")
}

/// A simple single-port tcp rule between two hosts in 10.0.0.0/24.
pub fn tcp_rule(src: u8, dst: u8, port: u16) -> Rule {
    Rule::builder()
        .source(Ipv4Addr::new(10, 0, 0, src))
        .destination(Ipv4Addr::new(10, 0, 0, dst))
        .service(NetworkService::tcp(port))
        .build()
        .expect("valid rule")
}

/// A source device holding the desired rules and a target device holding
/// the existing ones.
pub struct DevicePair {
    pub source: MemoryDevice,
    pub target: MemoryDevice,
}

impl DevicePair {
    pub fn new(desired: impl IntoIterator<Item = Rule>, existing: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            source: MemoryDevice::new().with_rules(desired),
            target: MemoryDevice::new().with_rules(existing),
        }
    }

    /// Desired `rule_a`, existing `rule_b`.
    pub fn a_over_b() -> Self {
        Self::new([rule_a()], [rule_b()])
    }
}

/// Write `rules` as a JSON array file `name` under `dir`.
pub fn write_rules_file(dir: &Path, name: &str, rules: &[Rule]) -> io::Result<PathBuf> {
    let path = dir.join(name);
    let records = Value::Array(rules.iter().map(Rule::to_value).collect());
    fs::write(&path, serde_json::to_string_pretty(&records)?)?;
    Ok(path)
}

/// Read a JSON array of rules back from `path`.
pub fn read_rules_file(path: &Path) -> io::Result<Vec<Value>> {
    let text = fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&text)? {
        Value::Array(records) => Ok(records),
        _ => Err(io::Error::new(io::ErrorKind::InvalidData, "not a JSON array")),
    }
}
