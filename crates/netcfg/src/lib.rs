//! # netcfg
//!
//! Keeps the firewall rules on a target device in line with the rules
//! published by a source.
//!
//! ## Overview
//!
//! - **Identity**: Rules, packet filters and owners are named by a digest of
//!   their canonical content, so equal content means equal identifier
//! - **Diff**: Desired and existing sets are compared per entity kind
//! - **Apply**: Deletions run before additions in dependency order, then
//!   the target commits once
//! - **Retry**: Each phase retries recoverable failures on a fresh
//!   connection within an attempt and time budget
//!
//! ## Usage
//!
//! ```rust
//! use netcfg::{Reconciler, ReconcilerConfig};
//! use netcfg::endpoint::MemoryDevice;
//! use netcfg::core::{NetworkService, Rule};
//! use std::net::Ipv4Addr;
//!
//! let rule = Rule::builder()
//!     .source(Ipv4Addr::new(10, 0, 0, 1))
//!     .destination(Ipv4Addr::new(10, 0, 0, 2))
//!     .service(NetworkService::tcp(443))
//!     .build()
//!     .unwrap();
//!
//! let source = MemoryDevice::new().with_rules([rule.clone()]);
//! let target = MemoryDevice::new();
//!
//! let report = Reconciler::new(source, target.clone(), ReconcilerConfig::default())
//!     .run()
//!     .unwrap();
//!
//! assert_eq!(report.applied.rules_added, 1);
//! assert_eq!(target.rules(), vec![rule]);
//! ```
//!
//! ## Re-exports
//!
//! - `netcfg::core` - Rules, filters, owners, identifiers and records
//! - `netcfg::endpoint` - Source and target traits, reference devices
//! - `netcfg::reconcile` - Diff, apply order and retry policy

pub mod config;
pub mod error;
pub mod reconciler;

pub use netcfg_core as core;
pub use netcfg_endpoint as endpoint;
pub use netcfg_reconcile as reconcile;

pub use config::ReconcilerConfig;
pub use error::{ConfigError, ReconcileError, Result};
pub use reconciler::{Reconciler, RunReport};

pub use netcfg_core::{Identifier, NetworkPeer, NetworkService, Owner, PacketFilter, Protocol, Rule};
pub use netcfg_endpoint::{AccessError, Source, SourceFactory, Target, TargetFactory};
pub use netcfg_reconcile::{ApplyStep, ChangePlan, Optimizer, RetryPolicy};
