//! Owner tags attached to rules.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ModelError, Result};
use crate::types::{Identified, Identifier, IDENTIFIER_PREFIX};

/// An opaque tag marking which party a rule belongs to.
///
/// The tag is its own identifier and must start with `X-`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Owner(Identifier);

impl Owner {
    pub fn new(tag: impl Into<String>) -> Result<Self> {
        let tag = tag.into();
        if !tag.starts_with(IDENTIFIER_PREFIX) {
            return Err(ModelError::OwnerPrefix(tag));
        }
        Ok(Self(Identifier::from_string(tag)))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Identified for Owner {
    fn identifier(&self) -> &Identifier {
        &self.0
    }
}

impl TryFrom<String> for Owner {
    type Error = ModelError;

    fn try_from(tag: String) -> Result<Self> {
        Self::new(tag)
    }
}

impl From<Owner> for String {
    fn from(owner: Owner) -> Self {
        owner.0.into_string()
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_is_its_identifier() {
        let owner = Owner::new("X-team-a").unwrap();
        assert_eq!(owner.identifier(), &"X-team-a");
        assert_eq!(owner.to_string(), "X-team-a");
    }

    #[test]
    fn test_owner_prefix_required() {
        assert_eq!(
            Owner::new("team-a").unwrap_err(),
            ModelError::OwnerPrefix("team-a".to_string())
        );
        assert!(Owner::new("x-lower").is_err());
        assert!(Owner::new("X-").is_ok());
    }

    #[test]
    fn test_owner_serde() {
        let owner: Owner = serde_json::from_str("\"X-o1\"").unwrap();
        assert_eq!(owner.as_str(), "X-o1");
        assert_eq!(serde_json::to_string(&owner).unwrap(), "\"X-o1\"");
        assert!(serde_json::from_str::<Owner>("\"o1\"").is_err());
    }
}
