//! Ordered application of changes to a target.
//!
//! Rules reference filters and owners, so a target may refuse to delete a
//! filter still in use or to add a rule whose filter does not exist yet.
//! Changes are therefore issued in a fixed order:
//!
//! 1. delete obsolete rules
//! 2. delete obsolete packet filters
//! 3. delete obsolete owners
//! 4. add new owners
//! 5. add new packet filters
//! 6. add new rules
//!
//! The first failing call stops the sequence. Changes already issued stay
//! on the target; nothing is rolled back. Committing is left to the caller.

use std::fmt;

use netcfg_core::{EntityKind, Identified, Identifier, Owner, PacketFilter, Rule};
use netcfg_endpoint::{Result, Target};

use crate::discrepancy::{Discrepancy, DiscrepancyFinder};
use crate::state::EntitySets;

/// One step of the apply order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ApplyStep {
    DeleteRules,
    DeleteFilters,
    DeleteOwners,
    AddOwners,
    AddFilters,
    AddRules,
}

impl ApplyStep {
    /// Every step in the order it runs.
    pub const ORDER: [ApplyStep; 6] = [
        ApplyStep::DeleteRules,
        ApplyStep::DeleteFilters,
        ApplyStep::DeleteOwners,
        ApplyStep::AddOwners,
        ApplyStep::AddFilters,
        ApplyStep::AddRules,
    ];

    /// The entity kind this step touches.
    pub fn kind(self) -> EntityKind {
        match self {
            Self::DeleteRules | Self::AddRules => EntityKind::Rule,
            Self::DeleteFilters | Self::AddFilters => EntityKind::PacketFilter,
            Self::DeleteOwners | Self::AddOwners => EntityKind::Owner,
        }
    }

    pub fn is_deletion(self) -> bool {
        matches!(
            self,
            Self::DeleteRules | Self::DeleteFilters | Self::DeleteOwners
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DeleteRules => "delete_rules",
            Self::DeleteFilters => "delete_filters",
            Self::DeleteOwners => "delete_owners",
            Self::AddOwners => "add_owners",
            Self::AddFilters => "add_filters",
            Self::AddRules => "add_rules",
        }
    }
}

impl fmt::Display for ApplyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single mutation, borrowed from a [`ChangePlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change<'a> {
    DeleteRule(&'a Identifier),
    DeleteFilter(&'a Identifier),
    DeleteOwner(&'a Identifier),
    AddOwner(&'a Owner),
    AddFilter(&'a PacketFilter),
    AddRule(&'a Rule),
}

impl<'a> Change<'a> {
    pub fn step(&self) -> ApplyStep {
        match self {
            Self::DeleteRule(_) => ApplyStep::DeleteRules,
            Self::DeleteFilter(_) => ApplyStep::DeleteFilters,
            Self::DeleteOwner(_) => ApplyStep::DeleteOwners,
            Self::AddOwner(_) => ApplyStep::AddOwners,
            Self::AddFilter(_) => ApplyStep::AddFilters,
            Self::AddRule(_) => ApplyStep::AddRules,
        }
    }

    /// Identifier of the entity being changed.
    pub fn identifier(&self) -> &'a Identifier {
        match *self {
            Self::DeleteRule(id) | Self::DeleteFilter(id) | Self::DeleteOwner(id) => id,
            Self::AddOwner(owner) => owner.identifier(),
            Self::AddFilter(filter) => filter.identifier(),
            Self::AddRule(rule) => rule.identifier(),
        }
    }

    /// Issue this change against `target`.
    pub fn issue<T: Target + ?Sized>(&self, target: &mut T) -> Result<()> {
        match *self {
            Self::DeleteRule(id) => target.delete_rule(id),
            Self::DeleteFilter(id) => target.delete_filter(id),
            Self::DeleteOwner(id) => target.delete_owner(id),
            Self::AddOwner(owner) => target.add_owner(owner),
            Self::AddFilter(filter) => target.add_filter(filter),
            Self::AddRule(rule) => target.add_rule(rule),
        }
    }
}

impl fmt::Display for Change<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.step().is_deletion() { "delete" } else { "add" };
        write!(f, "{} {} {}", verb, self.step().kind(), self.identifier())
    }
}

/// Everything that must change on a target, per entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangePlan {
    pub rules: Discrepancy<Rule>,
    pub filters: Discrepancy<PacketFilter>,
    pub owners: Discrepancy<Owner>,
}

impl ChangePlan {
    /// Diff desired against existing for all three kinds.
    pub fn compute(desired: &EntitySets, existing: &EntitySets) -> Self {
        Self {
            rules: DiscrepancyFinder::new(&desired.rules, &existing.rules).discrepancy(),
            filters: DiscrepancyFinder::new(&desired.filters, &existing.filters).discrepancy(),
            owners: DiscrepancyFinder::new(&desired.owners, &existing.owners).discrepancy(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.filters.is_empty() && self.owners.is_empty()
    }

    /// Total number of changes.
    pub fn len(&self) -> usize {
        self.rules.len() + self.filters.len() + self.owners.len()
    }

    /// Changes in apply order.
    pub fn changes(&self) -> impl Iterator<Item = Change<'_>> + '_ {
        let deletions = self
            .rules
            .to_delete
            .iter()
            .map(Change::DeleteRule)
            .chain(self.filters.to_delete.iter().map(Change::DeleteFilter))
            .chain(self.owners.to_delete.iter().map(Change::DeleteOwner));
        let additions = self
            .owners
            .to_add
            .iter()
            .map(Change::AddOwner)
            .chain(self.filters.to_add.iter().map(Change::AddFilter))
            .chain(self.rules.to_add.iter().map(Change::AddRule));
        deletions.chain(additions)
    }

    /// Issue every change against `target`, stopping at the first failure.
    pub fn apply<T: Target + ?Sized>(&self, target: &mut T) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();
        for change in self.changes() {
            if let Err(err) = change.issue(target) {
                tracing::warn!(
                    change = %change,
                    issued = report.total(),
                    error = %err,
                    "change failed, remaining changes skipped"
                );
                return Err(err);
            }
            tracing::debug!(change = %change, "issued change");
            report.record(change.step());
        }
        Ok(report)
    }
}

/// Counts of the changes issued, per step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub rules_deleted: usize,
    pub filters_deleted: usize,
    pub owners_deleted: usize,
    pub owners_added: usize,
    pub filters_added: usize,
    pub rules_added: usize,
}

impl ApplyReport {
    fn record(&mut self, step: ApplyStep) {
        let counter = match step {
            ApplyStep::DeleteRules => &mut self.rules_deleted,
            ApplyStep::DeleteFilters => &mut self.filters_deleted,
            ApplyStep::DeleteOwners => &mut self.owners_deleted,
            ApplyStep::AddOwners => &mut self.owners_added,
            ApplyStep::AddFilters => &mut self.filters_added,
            ApplyStep::AddRules => &mut self.rules_added,
        };
        *counter += 1;
    }

    /// Total changes issued.
    pub fn total(&self) -> usize {
        self.rules_deleted
            + self.filters_deleted
            + self.owners_deleted
            + self.owners_added
            + self.filters_added
            + self.rules_added
    }
}
