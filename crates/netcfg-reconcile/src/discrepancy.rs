//! Set difference between desired and existing entities.
//!
//! Works for any entity kind with a content-derived identifier. Comparison is
//! full value equality, so a changed rule shows up as one deletion plus one
//! addition rather than an update.

use std::collections::{BTreeSet, HashSet};
use std::hash::Hash;

use netcfg_core::{Identified, Identifier};

/// Compares a desired set against what a target holds.
#[derive(Debug)]
pub struct DiscrepancyFinder<'a, T> {
    desired: &'a HashSet<T>,
    existing: &'a HashSet<T>,
}

impl<'a, T> DiscrepancyFinder<'a, T>
where
    T: Identified + Eq + Hash + Clone,
{
    pub fn new(desired: &'a HashSet<T>, existing: &'a HashSet<T>) -> Self {
        Self { desired, existing }
    }

    /// Identifiers of existing entities that are not desired, sorted.
    pub fn to_delete(&self) -> Vec<Identifier> {
        self.existing
            .difference(self.desired)
            .map(|entity| entity.identifier().clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Desired entities the target lacks, sorted by identifier.
    pub fn to_add(&self) -> Vec<T> {
        let mut to_add: Vec<T> = self.desired.difference(self.existing).cloned().collect();
        to_add.sort_by(|a, b| a.identifier().cmp(b.identifier()));
        to_add
    }

    /// Both sides of the difference.
    pub fn discrepancy(&self) -> Discrepancy<T> {
        let discrepancy = Discrepancy {
            to_delete: self.to_delete(),
            to_add: self.to_add(),
        };
        tracing::debug!(
            to_delete = discrepancy.to_delete.len(),
            to_add = discrepancy.to_add.len(),
            "computed discrepancy"
        );
        discrepancy
    }
}

/// What must change for one entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discrepancy<T> {
    pub to_delete: Vec<Identifier>,
    pub to_add: Vec<T>,
}

impl<T> Discrepancy<T> {
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_add.is_empty()
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.to_delete.len() + self.to_add.len()
    }
}

impl<T> Default for Discrepancy<T> {
    fn default() -> Self {
        Self {
            to_delete: Vec::new(),
            to_add: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcfg_core::{NetworkService, Owner, PacketFilter};
    use netcfg_testkit::generators;
    use proptest::prelude::*;

    fn owners(tags: &[&str]) -> HashSet<Owner> {
        tags.iter().map(|t| Owner::new(*t).unwrap()).collect()
    }

    fn ids(tags: &[&str]) -> Vec<Identifier> {
        let mut ids: Vec<Identifier> = tags
            .iter()
            .map(|t| Owner::new(*t).unwrap().identifier().clone())
            .collect();
        ids.sort();
        ids
    }

    fn sorted(set: &HashSet<Owner>) -> Vec<Owner> {
        let mut v: Vec<Owner> = set.iter().cloned().collect();
        v.sort();
        v
    }

    #[test]
    fn test_empty_desired_deletes_everything() {
        let desired = owners(&[]);
        let existing = owners(&["X-a", "X-b"]);
        let finder = DiscrepancyFinder::new(&desired, &existing);

        assert!(finder.to_add().is_empty());
        assert_eq!(finder.to_delete(), ids(&["X-a", "X-b"]));
    }

    #[test]
    fn test_empty_existing_adds_everything() {
        let desired = owners(&["X-a", "X-b"]);
        let existing = owners(&[]);
        let finder = DiscrepancyFinder::new(&desired, &existing);

        assert!(finder.to_delete().is_empty());
        assert_eq!(finder.to_add(), sorted(&desired));
    }

    #[test]
    fn test_identical_sets_are_quiet() {
        let desired = owners(&["X-a", "X-b"]);
        let existing = desired.clone();
        assert!(DiscrepancyFinder::new(&desired, &existing).discrepancy().is_empty());
    }

    #[test]
    fn test_disjoint_sets() {
        let desired = owners(&["X-a", "X-b"]);
        let existing = owners(&["X-c", "X-d"]);
        let finder = DiscrepancyFinder::new(&desired, &existing);

        assert_eq!(finder.to_add(), sorted(&desired));
        assert_eq!(finder.to_delete(), ids(&["X-c", "X-d"]));
    }

    #[test]
    fn test_existing_subset_of_desired() {
        let desired = owners(&["X-a", "X-b", "X-c"]);
        let existing = owners(&["X-a"]);
        let finder = DiscrepancyFinder::new(&desired, &existing);

        assert_eq!(finder.to_add(), sorted(&owners(&["X-b", "X-c"])));
        assert!(finder.to_delete().is_empty());
    }

    #[test]
    fn test_desired_subset_of_existing() {
        let desired = owners(&["X-a"]);
        let existing = owners(&["X-a", "X-b", "X-c"]);
        let finder = DiscrepancyFinder::new(&desired, &existing);

        assert!(finder.to_add().is_empty());
        assert_eq!(finder.to_delete(), ids(&["X-b", "X-c"]));
    }

    #[test]
    fn test_partial_overlap() {
        let desired = owners(&["X-a", "X-b"]);
        let existing = owners(&["X-b", "X-c"]);
        let finder = DiscrepancyFinder::new(&desired, &existing);

        assert_eq!(finder.to_add(), sorted(&owners(&["X-a"])));
        assert_eq!(finder.to_delete(), ids(&["X-c"]));
        assert_eq!(finder.discrepancy().len(), 2);
    }

    #[test]
    fn test_filters_compare_by_content() {
        let desired: HashSet<PacketFilter> = [
            PacketFilter::new([NetworkService::tcp(80), NetworkService::icmp()]).unwrap(),
        ]
        .into_iter()
        .collect();
        let existing: HashSet<PacketFilter> = [
            PacketFilter::new([NetworkService::icmp(), NetworkService::tcp(80)]).unwrap(),
        ]
        .into_iter()
        .collect();

        assert!(DiscrepancyFinder::new(&desired, &existing).discrepancy().is_empty());
    }

    proptest! {
        #[test]
        fn prop_diff_is_set_difference(
            desired in prop::collection::hash_set(generators::rule(), 0..6),
            existing in prop::collection::hash_set(generators::rule(), 0..6),
        ) {
            let finder = DiscrepancyFinder::new(&desired, &existing);
            let to_add = finder.to_add();
            let to_delete = finder.to_delete();

            for rule in &to_add {
                prop_assert!(desired.contains(rule));
                prop_assert!(!existing.contains(rule));
            }
            prop_assert_eq!(to_add.len(), desired.difference(&existing).count());

            for rule in existing.difference(&desired) {
                prop_assert!(to_delete.contains(rule.identifier()));
            }
            for rule in desired.intersection(&existing) {
                prop_assert!(!to_delete.contains(rule.identifier()));
            }
        }

        #[test]
        fn prop_applying_diff_reaches_desired(
            desired in prop::collection::hash_set(generators::rule(), 0..6),
            existing in prop::collection::hash_set(generators::rule(), 0..6),
        ) {
            let discrepancy = DiscrepancyFinder::new(&desired, &existing).discrepancy();

            let mut result: HashSet<_> = existing
                .into_iter()
                .filter(|rule| !discrepancy.to_delete.contains(rule.identifier()))
                .collect();
            result.extend(discrepancy.to_add);

            prop_assert_eq!(result, desired);
        }
    }
}
