//! # netcfg endpoint
//!
//! Abstraction over where rules come from and where they go. Provides the
//! [`Source`] and [`Target`] traits, factories that create a fresh handle
//! per attempt, scoped sessions, and two reference implementations.
//!
//! ## Key Types
//!
//! - [`Source`] / [`Target`] - Raw reads and typed mutations
//! - [`SourceFactory`] / [`TargetFactory`] - Fresh handle per attempt; any
//!   `Fn() -> Result<T, AccessError>` closure is a factory
//! - [`Session`] - Opened endpoint, closed on drop
//! - [`AccessError`] - The only error endpoints return, classified as
//!   recoverable or fatal
//! - [`MemoryDevice`] - In-memory device with referential integrity
//! - [`JsonFileSource`] / [`JsonFileTarget`] - Array-of-rules JSON file
//!
//! ## Usage
//!
//! ```rust
//! use netcfg_endpoint::{MemoryDevice, Session, Target};
//!
//! let device = MemoryDevice::new();
//! let mut target = Session::open(device.target()).unwrap();
//! assert!(target.read_all_rules().unwrap().is_empty());
//! target.finish().unwrap();
//! ```

pub mod error;
pub mod json;
pub mod memory;
pub mod session;
pub mod traits;

pub use error::{AccessError, Result};
pub use json::{JsonFileSource, JsonFileTarget};
pub use memory::{MemoryDevice, MemorySource, MemoryTarget};
pub use session::Session;
pub use traits::{Endpoint, Source, SourceFactory, Target, TargetFactory};
