//! # netcfg core
//!
//! Pure primitives for netcfg: rules, packet filters, owners, and the
//! content-addressed identifiers that tie them together.
//!
//! This crate performs no I/O. It validates values, derives identifiers and
//! converts between entities and the raw JSON records collaborators exchange.
//!
//! ## Key Types
//!
//! - [`Rule`] - Sources, destinations, a packet filter and owner tags
//! - [`PacketFilter`] - Non-empty set of [`NetworkService`] values
//! - [`Owner`] - Tag naming the party a rule belongs to
//! - [`Identifier`] - Content-derived identity (`X-` + SHA-1 hex)
//!
//! ## Identity
//!
//! Identifiers are hashes of canonical JSON text. See [`canonical`] module.

pub mod canonical;
pub mod error;
pub mod filter;
pub mod namer;
pub mod owner;
pub mod peer;
pub mod record;
pub mod rule;
pub mod service;
pub mod types;

pub use error::{DeserializationError, ModelError};
pub use filter::PacketFilter;
pub use namer::generate_identifier;
pub use owner::Owner;
pub use peer::NetworkPeer;
pub use record::{
    decode_filter, decode_filters, decode_owner, decode_owners, decode_rule, decode_rules,
    FilterRecord, PeerRecord, RuleRecord, ServiceRecord,
};
pub use rule::{Rule, RuleBuilder};
pub use service::{NetworkService, Protocol};
pub use types::{EntityKind, Identified, Identifier, IDENTIFIER_PREFIX};
