//! Content addressing: stable identifiers from canonical text.

use sha1::{Digest, Sha1};

use crate::types::{Identifier, IDENTIFIER_PREFIX};

/// Derive the identifier of a canonical serialization.
///
/// The identifier is [`IDENTIFIER_PREFIX`] followed by the lowercase hex
/// SHA-1 digest of the UTF-8 bytes of `canonical`. Pure and deterministic:
/// equal text always yields an equal identifier.
pub fn generate_identifier(canonical: &str) -> Identifier {
    let digest = Sha1::digest(canonical.as_bytes());
    Identifier::from_string(format!("{}{}", IDENTIFIER_PREFIX, hex::encode(digest)))
}
