//! Rules: the unit of intended network access.
//!
//! A rule permits traffic from any of its sources to any of its
//! destinations for the services of its packet filter. Its identifier is
//! derived from all of that content plus its owners, so two rules with the
//! same content are the same rule wherever they were read from.

use std::collections::{BTreeSet, HashSet};

use crate::canonical;
use crate::error::{ModelError, Result};
use crate::filter::PacketFilter;
use crate::namer::generate_identifier;
use crate::owner::Owner;
use crate::peer::NetworkPeer;
use crate::service::NetworkService;
use crate::types::{Identified, Identifier};

/// An access rule.
///
/// Source and destination order is significant for identity; duplicates
/// are dropped keeping the first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    sources: Vec<NetworkPeer>,
    destinations: Vec<NetworkPeer>,
    packet_filter: PacketFilter,
    owners: BTreeSet<Owner>,
    identifier: Identifier,
}

impl Rule {
    /// Build a rule; rejects empty sources or destinations.
    pub fn new(
        sources: impl IntoIterator<Item = NetworkPeer>,
        destinations: impl IntoIterator<Item = NetworkPeer>,
        packet_filter: PacketFilter,
        owners: impl IntoIterator<Item = Owner>,
    ) -> Result<Self> {
        let sources = dedup_peers(sources);
        if sources.is_empty() {
            return Err(ModelError::EmptySources);
        }
        let destinations = dedup_peers(destinations);
        if destinations.is_empty() {
            return Err(ModelError::EmptyDestinations);
        }
        let owners: BTreeSet<Owner> = owners.into_iter().collect();

        let identifier = generate_identifier(&canonical::rule_text(
            &sources,
            &destinations,
            &packet_filter,
            &owners,
        ));

        Ok(Self {
            sources,
            destinations,
            packet_filter,
            owners,
            identifier,
        })
    }

    /// Start a builder.
    pub fn builder() -> RuleBuilder {
        RuleBuilder::default()
    }

    pub fn sources(&self) -> &[NetworkPeer] {
        &self.sources
    }

    pub fn destinations(&self) -> &[NetworkPeer] {
        &self.destinations
    }

    pub fn packet_filter(&self) -> &PacketFilter {
        &self.packet_filter
    }

    /// Owners in sorted order.
    pub fn owners(&self) -> &BTreeSet<Owner> {
        &self.owners
    }
}

impl Identified for Rule {
    fn identifier(&self) -> &Identifier {
        &self.identifier
    }
}

fn dedup_peers(peers: impl IntoIterator<Item = NetworkPeer>) -> Vec<NetworkPeer> {
    let mut seen = HashSet::new();
    peers.into_iter().filter(|peer| seen.insert(*peer)).collect()
}

/// Incremental construction of a [`Rule`].
#[derive(Debug, Clone, Default)]
pub struct RuleBuilder {
    sources: Vec<NetworkPeer>,
    destinations: Vec<NetworkPeer>,
    services: Vec<NetworkService>,
    owners: Vec<Owner>,
}

impl RuleBuilder {
    /// Append a source.
    pub fn source(mut self, peer: impl Into<NetworkPeer>) -> Self {
        self.sources.push(peer.into());
        self
    }

    /// Append a destination.
    pub fn destination(mut self, peer: impl Into<NetworkPeer>) -> Self {
        self.destinations.push(peer.into());
        self
    }

    /// Add a service to the rule's packet filter.
    pub fn service(mut self, service: NetworkService) -> Self {
        self.services.push(service);
        self
    }

    /// Add every service of an existing filter.
    pub fn filter(mut self, filter: &PacketFilter) -> Self {
        self.services.extend_from_slice(filter.services());
        self
    }

    /// Add an owner.
    pub fn owner(mut self, owner: Owner) -> Self {
        self.owners.push(owner);
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<Rule> {
        let packet_filter = PacketFilter::new(self.services)?;
        Rule::new(self.sources, self.destinations, packet_filter, self.owners)
    }
}
