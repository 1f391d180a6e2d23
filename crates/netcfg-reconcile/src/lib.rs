//! # netcfg reconcile
//!
//! The building blocks of a reconciliation run: set differences, the
//! dependency-ordered apply protocol, and the retry policy wrapped around
//! each phase.
//!
//! ## Key Types
//!
//! - [`DiscrepancyFinder`] - Generic desired-vs-existing diff
//! - [`EntitySets`] - Rules, filters and owners on one side of a diff
//! - [`ChangePlan`] - Diff of all three kinds, iterable in [`ApplyStep`] order
//! - [`Optimizer`] - Hook rewriting desired rules, [`PassThrough`] by default
//! - [`RetryPolicy`] - Attempt budget, time budget and fixed delay
//!
//! ## Apply Order
//!
//! Deletions run before additions, rules first when deleting and last when
//! adding, so no step ever leaves a rule pointing at a missing filter or
//! owner. See [`apply`] module.

pub mod apply;
pub mod discrepancy;
pub mod optimizer;
pub mod retry;
pub mod state;

pub use apply::{ApplyReport, ApplyStep, Change, ChangePlan};
pub use discrepancy::{Discrepancy, DiscrepancyFinder};
pub use optimizer::{Optimizer, PassThrough};
pub use retry::{Recoverable, Retried, RetryError, RetryPolicy};
pub use state::EntitySets;
