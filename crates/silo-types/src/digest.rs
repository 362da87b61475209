use std::fmt;

use serde::{Deserialize, Serialize};

use crate::algorithm::DigestAlgorithm;
use crate::error::TypeError;

/// An immutable digest: raw bytes tagged with the algorithm that produced
/// them.
///
/// The byte length is validated against the algorithm at construction, so a
/// `DigestValue` in hand is always structurally sound. The canonical textual
/// form is lower-case hexadecimal, two characters per byte, no separators.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DigestValue {
    algorithm: DigestAlgorithm,
    bytes: Vec<u8>,
}

impl DigestValue {
    /// Create a digest value, validating the byte length for the algorithm.
    pub fn new(algorithm: DigestAlgorithm, bytes: Vec<u8>) -> Result<Self, TypeError> {
        if bytes.len() != algorithm.digest_len() {
            return Err(TypeError::InvalidLength {
                algorithm: algorithm.name(),
                expected: algorithm.digest_len(),
                actual: bytes.len(),
            });
        }
        Ok(Self { algorithm, bytes })
    }

    /// Parse a digest from its lower- or upper-case hex rendering.
    pub fn from_hex(algorithm: DigestAlgorithm, s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::new(algorithm, bytes)
    }

    /// The algorithm that produced this digest.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lower-case hex encoding — the canonical textual form.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.bytes[..4])
    }
}

impl fmt::Debug for DigestValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DigestValue({}:{})", self.algorithm.name(), self.short_hex())
    }
}

impl fmt::Display for DigestValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
