use std::fmt;

use serde::{Deserialize, Serialize};

use crate::digest::DigestValue;
use crate::error::TypeError;

/// Opaque stable token that re-derives a physical storage path without
/// recomputation.
///
/// A `PathKey` is the lower-case hex rendering of a [`DigestValue`] — of the
/// stored content for content-addressed layouts, or of the caller's key
/// string for key-addressed layouts. Identical content (or identical key)
/// always yields the identical `PathKey`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathKey(String);

impl PathKey {
    /// Parse a path key, validating that it is non-empty lower-case hex.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.is_empty() {
            return Err(TypeError::InvalidKey("empty key".to_string()));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(TypeError::InvalidKey(format!(
                "key is not lower-case hex: {s}"
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// Derive the key for a digest — its canonical hex form.
    pub fn from_digest(digest: &DigestValue) -> Self {
        Self(digest.to_hex())
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in hex characters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the key is empty. Parsed keys never are.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = &self.0[..self.0.len().min(8)];
        write!(f, "PathKey({short})")
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PathKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::DigestAlgorithm;

    #[test]
    fn parse_accepts_lowercase_hex() {
        let key = PathKey::parse("5eb63bbbe01eeed093cb22bb8f5acdc3").unwrap();
        assert_eq!(key.len(), 32);
    }

    #[test]
    fn parse_rejects_uppercase() {
        assert!(PathKey::parse("5EB63BBB").is_err());
    }

    #[test]
    fn parse_rejects_non_hex() {
        assert!(PathKey::parse("zzzz").is_err());
        assert!(PathKey::parse("").is_err());
    }

    #[test]
    fn from_digest_matches_hex() {
        let digest = DigestValue::new(DigestAlgorithm::Sha256, vec![0xab; 32]).unwrap();
        let key = PathKey::from_digest(&digest);
        assert_eq!(key.as_str(), digest.to_hex());
    }

    #[test]
    fn identical_digests_yield_identical_keys() {
        let d1 = DigestValue::new(DigestAlgorithm::Blake3, vec![7; 32]).unwrap();
        let d2 = DigestValue::new(DigestAlgorithm::Blake3, vec![7; 32]).unwrap();
        assert_eq!(PathKey::from_digest(&d1), PathKey::from_digest(&d2));
    }

    #[test]
    fn display_is_full_key() {
        let key = PathKey::parse("abcdef0123456789").unwrap();
        assert_eq!(format!("{key}"), "abcdef0123456789");
    }

    #[test]
    fn serde_roundtrip() {
        let key = PathKey::parse("deadbeef").unwrap();
        let json = serde_json::to_string(&key).unwrap();
        let parsed: PathKey = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, key);
    }
}
