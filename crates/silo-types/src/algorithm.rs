use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A named digest algorithm with a fixed output length.
///
/// Algorithm names are parsed case-insensitively and with or without the
/// dash (`"SHA-256"`, `"sha256"`, and `"Sha-256"` all resolve to
/// [`DigestAlgorithm::Sha256`]). An unknown name fails at parse time —
/// never later, once bytes are already flowing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DigestAlgorithm {
    Blake3,
    Sha256,
    Sha512,
}

impl DigestAlgorithm {
    /// Parse an algorithm name (case-insensitive, dash optional).
    pub fn parse(name: &str) -> Result<Self, TypeError> {
        match name.to_ascii_lowercase().as_str() {
            "blake3" | "blake-3" => Ok(Self::Blake3),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            other => Err(TypeError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    /// The canonical lower-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Blake3 => "blake3",
            Self::Sha256 => "sha-256",
            Self::Sha512 => "sha-512",
        }
    }

    /// Digest output length in bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            Self::Blake3 => 32,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }

    /// Digest output length in hex characters (two per byte).
    pub fn hex_len(&self) -> usize {
        self.digest_len() * 2
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
