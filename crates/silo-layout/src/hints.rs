use std::collections::HashMap;

use tracing::{debug, warn};

use silo_types::{DigestAlgorithm, DigestValue};

/// Header key prefix recognized by [`DigestHints::from_headers`].
const CHECKSUM_HEADER_PREFIX: &str = "x-checksum-";

/// Caller-supplied precomputed digests, keyed by algorithm.
///
/// Hints let a caller that already knows a content digest skip the
/// recomputation a content-addressed derivation would otherwise perform.
/// This is an explicit trust boundary: hints are consumed, never verified
/// against the actual bytes. Algorithm names are matched case-insensitively;
/// entries for unknown algorithms or with the wrong byte length are
/// structurally unusable and treated as absent.
#[derive(Clone, Debug, Default)]
pub struct DigestHints {
    entries: HashMap<DigestAlgorithm, Vec<u8>>,
}

impl DigestHints {
    /// An empty hint set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a hint under an algorithm name (case-insensitive).
    ///
    /// Returns `false` — and keeps nothing — when the name is unknown.
    pub fn insert(&mut self, name: &str, bytes: Vec<u8>) -> bool {
        match DigestAlgorithm::parse(name) {
            Ok(algorithm) => {
                self.entries.insert(algorithm, bytes);
                true
            }
            Err(_) => {
                debug!(name, "ignoring hint for unknown digest algorithm");
                false
            }
        }
    }

    /// Builder-style [`insert`](Self::insert) for a known algorithm.
    pub fn with(mut self, algorithm: DigestAlgorithm, bytes: Vec<u8>) -> Self {
        self.entries.insert(algorithm, bytes);
        self
    }

    /// Fetch the hint for an algorithm as a validated [`DigestValue`].
    ///
    /// A hint whose byte length does not match the algorithm cannot be a
    /// digest of anything; it is skipped with a warning rather than trusted.
    pub fn get(&self, algorithm: DigestAlgorithm) -> Option<DigestValue> {
        let bytes = self.entries.get(&algorithm)?;
        match DigestValue::new(algorithm, bytes.clone()) {
            Ok(digest) => Some(digest),
            Err(err) => {
                warn!(%algorithm, %err, "ignoring malformed digest hint");
                None
            }
        }
    }

    /// Number of usable entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no hints are recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Extract digest hints from a generic string-keyed header map.
    ///
    /// The convention is `x-checksum-<algorithm>` (keys matched
    /// case-insensitively) with a hex-encoded value, e.g.
    /// `x-checksum-sha-256: e3b0c442…`. Entries that fail to decode are
    /// skipped with a warning; unrelated headers are ignored.
    pub fn from_headers(headers: &HashMap<String, String>) -> Self {
        let mut hints = Self::new();
        for (key, value) in headers {
            let lowered = key.to_ascii_lowercase();
            let Some(name) = lowered.strip_prefix(CHECKSUM_HEADER_PREFIX) else {
                continue;
            };
            match hex::decode(value.trim()) {
                Ok(bytes) => {
                    hints.insert(name, bytes);
                }
                Err(err) => {
                    warn!(header = %key, %err, "ignoring undecodable checksum header");
                }
            }
        }
        hints
    }
}
