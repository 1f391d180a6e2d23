//! Endpoint traits: the abstract interface to rule sources and targets.
//!
//! The reconciler never talks to a device directly. It asks a factory for a
//! fresh handle on every attempt, opens a session on it, and reads or
//! mutates through these traits.
//!
//! # Design Notes
//!
//! - **Raw reads**: reads return JSON records; decoding and validation
//!   happen in the caller so every endpoint is checked the same way.
//! - **Typed writes**: mutations take validated entities or identifiers.
//! - **Explicit commit**: a target may buffer mutations until
//!   [`Target::apply_changes`].

use netcfg_core::{Identifier, Owner, PacketFilter, Rule};
use serde_json::Value;

use crate::error::Result;

/// A connection with an explicit open/close lifecycle.
pub trait Endpoint {
    /// Establish the session.
    fn open(&mut self) -> Result<()>;

    /// Tear the session down.
    fn close(&mut self) -> Result<()>;
}

/// Where desired rules come from.
pub trait Source: Endpoint {
    /// Raw records of every desired rule.
    fn read_all_rules(&mut self) -> Result<Vec<Value>>;
}

/// The device whose configuration is reconciled.
pub trait Target: Endpoint {
    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    fn read_all_rules(&mut self) -> Result<Vec<Value>>;

    fn read_all_filters(&mut self) -> Result<Vec<Value>>;

    /// Raw owner tags (JSON strings).
    fn read_all_owners(&mut self) -> Result<Vec<Value>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    fn add_rule(&mut self, rule: &Rule) -> Result<()>;

    fn delete_rule(&mut self, identifier: &Identifier) -> Result<()>;

    fn add_filter(&mut self, filter: &PacketFilter) -> Result<()>;

    fn delete_filter(&mut self, identifier: &Identifier) -> Result<()>;

    fn add_owner(&mut self, owner: &Owner) -> Result<()>;

    fn delete_owner(&mut self, identifier: &Identifier) -> Result<()>;

    /// Commit every mutation issued in this session.
    fn apply_changes(&mut self) -> Result<()>;
}

/// Produces a fresh, unopened source handle per attempt.
pub trait SourceFactory {
    type Source: Source;

    fn create_source(&self) -> Result<Self::Source>;
}

/// Produces a fresh, unopened target handle per attempt.
pub trait TargetFactory {
    type Target: Target;

    fn create_target(&self) -> Result<Self::Target>;
}

impl<F, S> SourceFactory for F
where
    F: Fn() -> Result<S>,
    S: Source,
{
    type Source = S;

    fn create_source(&self) -> Result<S> {
        self()
    }
}

impl<F, T> TargetFactory for F
where
    F: Fn() -> Result<T>,
    T: Target,
{
    type Target = T;

    fn create_target(&self) -> Result<T> {
        self()
    }
}
