//! In-memory device.
//!
//! Behaves like a small firewall: rules reference filters and owners by
//! identifier, and the device refuses changes that would break those
//! references. All handles created from one [`MemoryDevice`] share its state,
//! so a test can inspect the device after a reconciler has dropped its
//! handles.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use netcfg_core::{Identified, Identifier, Owner, PacketFilter, Rule};
use serde_json::Value;

use crate::error::{AccessError, Result};
use crate::traits::{Endpoint, Source, SourceFactory, Target, TargetFactory};

/// Shared in-memory device state.
///
/// Cloning yields another reference to the same device.
#[derive(Clone, Default)]
pub struct MemoryDevice {
    inner: Arc<RwLock<DeviceState>>,
}

#[derive(Default)]
struct DeviceState {
    rules: BTreeMap<Identifier, Rule>,
    filters: BTreeMap<Identifier, PacketFilter>,
    owners: BTreeMap<Identifier, Owner>,

    /// Successful commits.
    commits: u64,

    /// Connection attempts, successful or not.
    connections: u64,

    /// Remaining connection attempts to refuse.
    refuse_connections: u32,
}

impl MemoryDevice {
    /// Create an empty device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install rules together with the filters and owners they reference.
    pub fn with_rules(self, rules: impl IntoIterator<Item = Rule>) -> Self {
        {
            let mut state = self.write();
            for rule in rules {
                let filter = rule.packet_filter().clone();
                state.filters.insert(filter.identifier().clone(), filter);
                for owner in rule.owners() {
                    state.owners.insert(owner.identifier().clone(), owner.clone());
                }
                state.rules.insert(rule.identifier().clone(), rule);
            }
        }
        self
    }

    /// Install a filter no rule references.
    pub fn with_filter(self, filter: PacketFilter) -> Self {
        self.write().filters.insert(filter.identifier().clone(), filter);
        self
    }

    /// Install an owner no rule references.
    pub fn with_owner(self, owner: Owner) -> Self {
        self.write().owners.insert(owner.identifier().clone(), owner);
        self
    }

    /// Refuse the next `count` connection attempts with a recoverable error.
    pub fn refuse_connections(&self, count: u32) {
        self.write().refuse_connections = count;
    }

    /// Rules in identifier order.
    pub fn rules(&self) -> Vec<Rule> {
        self.read().rules.values().cloned().collect()
    }

    /// Filters in identifier order.
    pub fn filters(&self) -> Vec<PacketFilter> {
        self.read().filters.values().cloned().collect()
    }

    /// Owners in identifier order.
    pub fn owners(&self) -> Vec<Owner> {
        self.read().owners.values().cloned().collect()
    }

    pub fn commits(&self) -> u64 {
        self.read().commits
    }

    pub fn connections(&self) -> u64 {
        self.read().connections
    }

    /// A handle that serves this device's rules as desired state.
    pub fn source(&self) -> MemorySource {
        MemorySource {
            device: self.clone(),
            open: false,
        }
    }

    /// A handle that reconciles this device.
    pub fn target(&self) -> MemoryTarget {
        MemoryTarget {
            device: self.clone(),
            open: false,
        }
    }

    fn connect(&self) -> Result<()> {
        let mut state = self.write();
        state.connections += 1;
        if state.refuse_connections > 0 {
            state.refuse_connections -= 1;
            return Err(AccessError::Connection("memory device refused connection".into()));
        }
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, DeviceState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, DeviceState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SourceFactory for MemoryDevice {
    type Source = MemorySource;

    fn create_source(&self) -> Result<MemorySource> {
        Ok(self.source())
    }
}

impl TargetFactory for MemoryDevice {
    type Target = MemoryTarget;

    fn create_target(&self) -> Result<MemoryTarget> {
        Ok(self.target())
    }
}

/// Source handle over a [`MemoryDevice`].
pub struct MemorySource {
    device: MemoryDevice,
    open: bool,
}

impl Endpoint for MemorySource {
    fn open(&mut self) -> Result<()> {
        self.device.connect()?;
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }
}

impl Source for MemorySource {
    fn read_all_rules(&mut self) -> Result<Vec<Value>> {
        ensure_open(self.open)?;
        Ok(self.device.read().rules.values().map(Rule::to_value).collect())
    }
}

/// Target handle over a [`MemoryDevice`].
///
/// Mutations take effect immediately; [`Target::apply_changes`] counts a
/// commit.
pub struct MemoryTarget {
    device: MemoryDevice,
    open: bool,
}

impl MemoryTarget {
    fn state(&self) -> Result<RwLockWriteGuard<'_, DeviceState>> {
        ensure_open(self.open)?;
        Ok(self.device.write())
    }
}

impl Endpoint for MemoryTarget {
    fn open(&mut self) -> Result<()> {
        self.device.connect()?;
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }
}

impl Target for MemoryTarget {
    fn read_all_rules(&mut self) -> Result<Vec<Value>> {
        Ok(self.state()?.rules.values().map(Rule::to_value).collect())
    }

    fn read_all_filters(&mut self) -> Result<Vec<Value>> {
        Ok(self.state()?.filters.values().map(PacketFilter::to_value).collect())
    }

    fn read_all_owners(&mut self) -> Result<Vec<Value>> {
        Ok(self.state()?.owners.values().map(Owner::to_value).collect())
    }

    fn add_rule(&mut self, rule: &Rule) -> Result<()> {
        let mut state = self.state()?;
        let id = rule.identifier();
        if state.rules.contains_key(id) {
            return Err(rejected(format!("rule {} already exists", id)));
        }
        let filter_id = rule.packet_filter().identifier();
        if !state.filters.contains_key(filter_id) {
            return Err(rejected(format!("rule {} references unknown filter {}", id, filter_id)));
        }
        if let Some(owner) = rule.owners().iter().find(|o| !state.owners.contains_key(o.identifier())) {
            return Err(rejected(format!("rule {} references unknown owner {}", id, owner)));
        }
        state.rules.insert(id.clone(), rule.clone());
        Ok(())
    }

    fn delete_rule(&mut self, identifier: &Identifier) -> Result<()> {
        let mut state = self.state()?;
        if state.rules.remove(identifier).is_none() {
            return Err(rejected(format!("unknown rule {}", identifier)));
        }
        Ok(())
    }

    fn add_filter(&mut self, filter: &PacketFilter) -> Result<()> {
        let mut state = self.state()?;
        let id = filter.identifier();
        if state.filters.contains_key(id) {
            return Err(rejected(format!("filter {} already exists", id)));
        }
        state.filters.insert(id.clone(), filter.clone());
        Ok(())
    }

    fn delete_filter(&mut self, identifier: &Identifier) -> Result<()> {
        let mut state = self.state()?;
        if let Some(rule) = state
            .rules
            .values()
            .find(|r| r.packet_filter().identifier() == identifier)
        {
            return Err(rejected(format!(
                "filter {} is used by rule {}",
                identifier,
                rule.identifier()
            )));
        }
        if state.filters.remove(identifier).is_none() {
            return Err(rejected(format!("unknown filter {}", identifier)));
        }
        Ok(())
    }

    fn add_owner(&mut self, owner: &Owner) -> Result<()> {
        let mut state = self.state()?;
        let id = owner.identifier();
        if state.owners.contains_key(id) {
            return Err(rejected(format!("owner {} already exists", id)));
        }
        state.owners.insert(id.clone(), owner.clone());
        Ok(())
    }

    fn delete_owner(&mut self, identifier: &Identifier) -> Result<()> {
        let mut state = self.state()?;
        if let Some(rule) = state
            .rules
            .values()
            .find(|r| r.owners().iter().any(|o| o.identifier() == identifier))
        {
            return Err(rejected(format!(
                "owner {} is used by rule {}",
                identifier,
                rule.identifier()
            )));
        }
        if state.owners.remove(identifier).is_none() {
            return Err(rejected(format!("unknown owner {}", identifier)));
        }
        Ok(())
    }

    fn apply_changes(&mut self) -> Result<()> {
        self.state()?.commits += 1;
        Ok(())
    }
}

fn ensure_open(open: bool) -> Result<()> {
    if open {
        Ok(())
    } else {
        Err(AccessError::NotOpen)
    }
}

fn rejected(reason: String) -> AccessError {
    AccessError::Rejected(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use netcfg_core::{decode_rules, NetworkService};
    use std::net::Ipv4Addr;

    fn rule(port: u16, owner: Option<&str>) -> Rule {
        let mut builder = Rule::builder()
            .source(Ipv4Addr::new(10, 0, 0, 1))
            .destination(Ipv4Addr::new(10, 0, 0, 2))
            .service(NetworkService::tcp(port));
        if let Some(owner) = owner {
            builder = builder.owner(Owner::new(owner).unwrap());
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_seeded_rules_bring_dependencies() {
        let device = MemoryDevice::new().with_rules([rule(22, Some("X-ops"))]);
        assert_eq!(device.rules().len(), 1);
        assert_eq!(device.filters().len(), 1);
        assert_eq!(device.owners().len(), 1);
    }

    #[test]
    fn test_requires_open_session() {
        let device = MemoryDevice::new();
        let mut target = device.target();
        assert!(matches!(target.read_all_rules(), Err(AccessError::NotOpen)));

        let mut source = device.source();
        assert!(matches!(source.read_all_rules(), Err(AccessError::NotOpen)));
    }

    #[test]
    fn test_rule_needs_filter_and_owner() {
        let device = MemoryDevice::new();
        let mut target = Session::open(device.target()).unwrap();
        let r = rule(22, Some("X-ops"));

        let err = target.add_rule(&r).unwrap_err();
        assert!(matches!(err, AccessError::Rejected(ref m) if m.contains("unknown filter")));
        assert!(!err.is_recoverable());

        target.add_filter(r.packet_filter()).unwrap();
        let err = target.add_rule(&r).unwrap_err();
        assert!(matches!(err, AccessError::Rejected(ref m) if m.contains("unknown owner")));

        target.add_owner(&Owner::new("X-ops").unwrap()).unwrap();
        target.add_rule(&r).unwrap();
        target.apply_changes().unwrap();
        target.finish().unwrap();

        assert_eq!(device.rules(), vec![r]);
        assert_eq!(device.commits(), 1);
    }

    #[test]
    fn test_referenced_entities_cannot_be_deleted() {
        let r = rule(443, Some("X-web"));
        let device = MemoryDevice::new().with_rules([r.clone()]);
        let mut target = Session::open(device.target()).unwrap();

        let err = target.delete_filter(r.packet_filter().identifier()).unwrap_err();
        assert!(matches!(err, AccessError::Rejected(ref m) if m.contains("is used by rule")));

        let owner = Owner::new("X-web").unwrap();
        assert!(target.delete_owner(owner.identifier()).is_err());

        target.delete_rule(r.identifier()).unwrap();
        target.delete_filter(r.packet_filter().identifier()).unwrap();
        target.delete_owner(owner.identifier()).unwrap();

        assert!(matches!(
            target.delete_rule(r.identifier()),
            Err(AccessError::Rejected(_))
        ));
    }

    #[test]
    fn test_reads_decode_back() {
        let rules = [rule(22, None), rule(80, Some("X-web"))];
        let device = MemoryDevice::new().with_rules(rules.clone());
        let mut target = Session::open(device.target()).unwrap();

        let decoded = decode_rules(target.read_all_rules().unwrap()).unwrap();
        assert_eq!(decoded.len(), 2);
        for r in &rules {
            assert!(decoded.contains(r));
        }
        assert_eq!(target.read_all_filters().unwrap().len(), 2);
        assert_eq!(target.read_all_owners().unwrap(), vec![Value::from("X-web")]);
    }

    #[test]
    fn test_refused_connections_are_recoverable() {
        let device = MemoryDevice::new();
        device.refuse_connections(2);

        for _ in 0..2 {
            let err = Session::open(device.target()).err().unwrap();
            assert!(err.is_recoverable());
        }
        assert!(Session::open(device.target()).is_ok());
        assert_eq!(device.connections(), 3);
    }
}
