//! Scripted endpoints that record every call and fail on demand.
//!
//! Handles created from the same [`Journal`] append to one shared log, so a
//! test can assert on the exact sequence of calls across several retry
//! attempts.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use netcfg_core::{Identified, Identifier, Owner, PacketFilter, Rule};
use netcfg_endpoint::{AccessError, Endpoint, Result, Source, Target};
use serde_json::Value;

/// A recorded endpoint call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open,
    Close,
    ReadRules,
    ReadFilters,
    ReadOwners,
    DeleteRule(Identifier),
    DeleteFilter(Identifier),
    DeleteOwner(Identifier),
    AddOwner(Identifier),
    AddFilter(Identifier),
    AddRule(Identifier),
    ApplyChanges,
}

impl Call {
    /// Whether the call changes target state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::DeleteRule(_)
                | Self::DeleteFilter(_)
                | Self::DeleteOwner(_)
                | Self::AddOwner(_)
                | Self::AddFilter(_)
                | Self::AddRule(_)
        )
    }
}

/// The operation a scripted failure is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Open,
    Close,
    Read,
    DeleteRule,
    DeleteFilter,
    DeleteOwner,
    AddOwner,
    AddFilter,
    AddRule,
    ApplyChanges,
}

/// Shared, append-only call log.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Journal {
    pub fn record(&self, call: Call) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    /// Every call so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Only the mutating calls, in order.
    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }
}

/// Counts factory invocations across clones.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicU32>);

impl CallCounter {
    /// Increment and return the new count.
    pub fn bump(&self) -> u32 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}

type Fault = fn() -> AccessError;

/// A source returning fixed records.
pub struct ScriptedSource {
    journal: Journal,
    records: Vec<Value>,
    fault: Option<(Op, Fault)>,
}

impl ScriptedSource {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            records: Vec::new(),
            fault: None,
        }
    }

    pub fn with_rules(mut self, rules: &[Rule]) -> Self {
        self.records = rules.iter().map(Rule::to_value).collect();
        self
    }

    /// Serve raw records as they are, valid or not.
    pub fn with_records(mut self, records: Vec<Value>) -> Self {
        self.records = records;
        self
    }

    /// Fail every call to `op` with the error `fault` builds.
    pub fn fail_on(mut self, op: Op, fault: Fault) -> Self {
        self.fault = Some((op, fault));
        self
    }

    fn check(&self, op: Op) -> Result<()> {
        check(self.fault, op)
    }
}

impl Endpoint for ScriptedSource {
    fn open(&mut self) -> Result<()> {
        self.journal.record(Call::Open);
        self.check(Op::Open)
    }

    fn close(&mut self) -> Result<()> {
        self.journal.record(Call::Close);
        self.check(Op::Close)
    }
}

impl Source for ScriptedSource {
    fn read_all_rules(&mut self) -> Result<Vec<Value>> {
        self.journal.record(Call::ReadRules);
        self.check(Op::Read)?;
        Ok(self.records.clone())
    }
}

/// A target returning fixed reads and accepting every mutation.
pub struct ScriptedTarget {
    journal: Journal,
    rules: Vec<Value>,
    filters: Vec<Value>,
    owners: Vec<Value>,
    fault: Option<(Op, Fault)>,
}

impl ScriptedTarget {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            rules: Vec::new(),
            filters: Vec::new(),
            owners: Vec::new(),
            fault: None,
        }
    }

    /// Report `rules` and everything they reference as existing.
    pub fn with_rules(mut self, rules: &[Rule]) -> Self {
        self.rules = rules.iter().map(Rule::to_value).collect();
        self.filters = rules.iter().map(|r| r.packet_filter().to_value()).collect();
        self.owners = rules
            .iter()
            .flat_map(|r| r.owners().iter().map(Owner::to_value))
            .collect();
        self
    }

    /// Report an extra filter no rule references.
    pub fn with_filter(mut self, filter: &PacketFilter) -> Self {
        self.filters.push(filter.to_value());
        self
    }

    /// Report an extra owner no rule references.
    pub fn with_owner(mut self, owner: &Owner) -> Self {
        self.owners.push(owner.to_value());
        self
    }

    /// Fail every call to `op` with the error `fault` builds.
    pub fn fail_on(mut self, op: Op, fault: Fault) -> Self {
        self.fault = Some((op, fault));
        self
    }

    fn check(&self, op: Op) -> Result<()> {
        check(self.fault, op)
    }

    fn mutate(&mut self, op: Op, call: Call) -> Result<()> {
        self.journal.record(call);
        self.check(op)
    }
}

impl Endpoint for ScriptedTarget {
    fn open(&mut self) -> Result<()> {
        self.journal.record(Call::Open);
        self.check(Op::Open)
    }

    fn close(&mut self) -> Result<()> {
        self.journal.record(Call::Close);
        self.check(Op::Close)
    }
}

impl Target for ScriptedTarget {
    fn read_all_rules(&mut self) -> Result<Vec<Value>> {
        self.journal.record(Call::ReadRules);
        self.check(Op::Read)?;
        Ok(self.rules.clone())
    }

    fn read_all_filters(&mut self) -> Result<Vec<Value>> {
        self.journal.record(Call::ReadFilters);
        self.check(Op::Read)?;
        Ok(self.filters.clone())
    }

    fn read_all_owners(&mut self) -> Result<Vec<Value>> {
        self.journal.record(Call::ReadOwners);
        self.check(Op::Read)?;
        Ok(self.owners.clone())
    }

    fn add_rule(&mut self, rule: &Rule) -> Result<()> {
        self.mutate(Op::AddRule, Call::AddRule(rule.identifier().clone()))
    }

    fn delete_rule(&mut self, identifier: &Identifier) -> Result<()> {
        self.mutate(Op::DeleteRule, Call::DeleteRule(identifier.clone()))
    }

    fn add_filter(&mut self, filter: &PacketFilter) -> Result<()> {
        self.mutate(Op::AddFilter, Call::AddFilter(filter.identifier().clone()))
    }

    fn delete_filter(&mut self, identifier: &Identifier) -> Result<()> {
        self.mutate(Op::DeleteFilter, Call::DeleteFilter(identifier.clone()))
    }

    fn add_owner(&mut self, owner: &Owner) -> Result<()> {
        self.mutate(Op::AddOwner, Call::AddOwner(owner.identifier().clone()))
    }

    fn delete_owner(&mut self, identifier: &Identifier) -> Result<()> {
        self.mutate(Op::DeleteOwner, Call::DeleteOwner(identifier.clone()))
    }

    fn apply_changes(&mut self) -> Result<()> {
        self.journal.record(Call::ApplyChanges);
        self.check(Op::ApplyChanges)
    }
}

fn check(fault: Option<(Op, Fault)>, op: Op) -> Result<()> {
    match fault {
        Some((failing, fault)) if failing == op => Err(fault()),
        _ => Ok(()),
    }
}
