//! Strong type definitions shared by all entities.
//!
//! Identifiers are newtypes so that a rule identifier can never be confused
//! with an arbitrary string at compile time.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Prefix carried by every generated identifier and required on owner tags.
pub const IDENTIFIER_PREFIX: &str = "X-";

/// A content-derived entity identifier.
///
/// Rules and packet filters get `X-` followed by the hex SHA-1 of their
/// canonical text. An owner's identifier is its tag.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub(crate) fn from_string(value: String) -> Self {
        Self(value)
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the identifier text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

/// An entity whose identity is derived from its content.
pub trait Identified {
    /// The entity's identifier.
    fn identifier(&self) -> &Identifier;
}

/// The three kinds of entity kept in sync on a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Rule,
    PacketFilter,
    Owner,
}

impl EntityKind {
    /// Lowercase name used in log fields and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::PacketFilter => "filter",
            Self::Owner => "owner",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identifier_display_is_raw_text() {
        let id = Identifier::from_string("X-abc".to_string());
        assert_eq!(format!("{}", id), "X-abc");
        assert_eq!(format!("{:?}", id), "Identifier(X-abc)");
    }

    #[test]
    fn test_identifier_borrows_as_str() {
        let mut set = HashSet::new();
        set.insert(Identifier::from_string("X-1".to_string()));
        assert!(set.contains("X-1"));
        assert!(!set.contains("X-2"));
    }

    #[test]
    fn test_identifier_serializes_transparently() {
        let id = Identifier::from_string("X-42".to_string());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"X-42\"");
    }
}
