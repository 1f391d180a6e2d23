//! # netcfg testkit
//!
//! Testing utilities for netcfg.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Identifiers that must never change, computed from
//!   text, filter records and rule records
//! - **Generators**: Proptest strategies for peers, services, filters,
//!   owners and rules
//! - **Fixtures**: Two independent rules, device pairs and rule files
//! - **Scripted endpoints**: Sources and targets that log every call and
//!   fail on demand
//!
//! ## Golden Vectors
//!
//! ```rust
//! use netcfg_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, computed) in verify_all_vectors() {
//!     assert!(matches, "{}: {}", name, computed);
//! }
//! ```
//!
//! ## Scripted Endpoints
//!
//! ```rust
//! use netcfg_endpoint::{AccessError, Target};
//! use netcfg_testkit::scripted::{Journal, Op, ScriptedTarget};
//! use netcfg_testkit::fixtures;
//!
//! let journal = Journal::default();
//! let mut target = ScriptedTarget::new(journal.clone())
//!     .fail_on(Op::AddRule, || AccessError::Rejected("full".into()));
//! assert!(target.add_rule(&fixtures::rule_a()).is_err());
//! assert_eq!(journal.mutations().len(), 1);
//! ```

pub mod fixtures;
pub mod generators;
pub mod scripted;
pub mod vectors;

pub use fixtures::DevicePair;
pub use scripted::{Call, CallCounter, Journal, Op, ScriptedSource, ScriptedTarget};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};
