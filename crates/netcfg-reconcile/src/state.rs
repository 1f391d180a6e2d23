//! Entity sets on either side of a reconciliation.

use std::collections::HashSet;

use netcfg_core::{decode_filters, decode_owners, decode_rules, Owner, PacketFilter, Rule};
use netcfg_endpoint::{Result, Target};

/// Rules, filters and owners, each as a set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySets {
    pub rules: HashSet<Rule>,
    pub filters: HashSet<PacketFilter>,
    pub owners: HashSet<Owner>,
}

impl EntitySets {
    /// Desired state implied by a set of rules: the rules plus every filter
    /// and owner they reference.
    pub fn from_rules(rules: HashSet<Rule>) -> Self {
        let filters = rules.iter().map(|rule| rule.packet_filter().clone()).collect();
        let owners = rules
            .iter()
            .flat_map(|rule| rule.owners().iter().cloned())
            .collect();
        Self {
            rules,
            filters,
            owners,
        }
    }

    /// Read and decode everything a target holds.
    pub fn read_from<T: Target + ?Sized>(target: &mut T) -> Result<Self> {
        let rules = decode_rules(target.read_all_rules()?)?;
        let filters = decode_filters(target.read_all_filters()?)?;
        let owners = decode_owners(target.read_all_owners()?)?;
        tracing::debug!(
            rules = rules.len(),
            filters = filters.len(),
            owners = owners.len(),
            "read target state"
        );
        Ok(Self {
            rules,
            filters,
            owners,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.filters.is_empty() && self.owners.is_empty()
    }
}
