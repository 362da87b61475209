use std::io::Read;

use tracing::debug;
use uuid::Uuid;

use silo_digest::{DigestPool, HasherFactory, PoolConfig};
use silo_types::{DigestAlgorithm, DigestValue, DirectoryLayout, PathKey};

use crate::error::LayoutResult;
use crate::fanout::{self, fan_out};
use crate::hints::DigestHints;
use crate::source::{PathSource, ResolvedTarget};
use crate::traits::PathAlgorithm;

/// Key-addressed path derivation: the storage location is a fan-out of the
/// digest of a caller-supplied key string, independent of the content.
///
/// The path is derivable before any byte of the stream is read. This is
/// deliberately not content addressing: identical content under different
/// keys yields different paths, but a given key always reproduces the
/// identical path, enabling deterministic overwrite and retrieval by key
/// alone. When no key is supplied one is generated from a random token.
///
/// Key hashing is the hot path — every derivation hashes one short string —
/// so instances come from a [`DigestPool`] rather than being constructed
/// per call.
pub struct KeyAddressed {
    layout: DirectoryLayout,
    pool: DigestPool,
}

impl KeyAddressed {
    /// Create a key-addressed algorithm with the given hasher pool
    /// configuration.
    ///
    /// Fails if the layout's fan-out cannot be satisfied by the algorithm's
    /// digest length.
    pub fn new(
        algorithm: DigestAlgorithm,
        layout: DirectoryLayout,
        pool_config: PoolConfig,
    ) -> LayoutResult<Self> {
        fanout::validate(&layout, algorithm)?;
        Ok(Self {
            layout,
            pool: DigestPool::new(HasherFactory::new(algorithm), pool_config),
        })
    }

    /// Create from an algorithm name (case-insensitive). Unknown names fail
    /// here, at construction.
    pub fn for_name(
        name: &str,
        layout: DirectoryLayout,
        pool_config: PoolConfig,
    ) -> LayoutResult<Self> {
        let factory = HasherFactory::for_name(name)?;
        fanout::validate(&layout, factory.algorithm())?;
        Ok(Self {
            layout,
            pool: DigestPool::new(factory, pool_config),
        })
    }

    /// The configured digest algorithm.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.pool.factory().algorithm()
    }

    /// Bind a stream to the path derived from an explicit key.
    ///
    /// The returned source is resolved immediately; the stream passes
    /// through unwrapped.
    pub fn derive_keyed<R: Read>(&self, stream: R, key: &str) -> LayoutResult<PathSource<R>> {
        let digest = self.hash_key(key)?;
        let path_key = PathKey::from_digest(&digest);
        let path = fan_out(path_key.as_str(), &self.layout)?;
        Ok(PathSource::resolved(
            stream,
            ResolvedTarget {
                key: path_key,
                path,
                digest: None,
            },
        ))
    }

    /// Hash a key string through the pooled hashers.
    fn hash_key(&self, key: &str) -> LayoutResult<DigestValue> {
        let mut hasher = self.pool.borrow()?;
        hasher.update(key.as_bytes());
        Ok(hasher.finalize_reset())
    }
}

impl PathAlgorithm for KeyAddressed {
    fn layout(&self) -> &DirectoryLayout {
        &self.layout
    }

    /// Derive with a generated key: a random token hashed like any caller
    /// key. Hints carry content digests and are irrelevant here.
    fn derive<R: Read>(&self, stream: R, _hints: &DigestHints) -> LayoutResult<PathSource<R>> {
        let token = Uuid::new_v4().to_string();
        debug!(%token, "generated key token for key-addressed derivation");
        self.derive_keyed(stream, &token)
    }

    fn lookup(&self, key: &PathKey) -> LayoutResult<String> {
        fan_out(key.as_str(), &self.layout)
    }
}

impl std::fmt::Debug for KeyAddressed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyAddressed")
            .field("algorithm", &self.algorithm())
            .field("layout", &self.layout)
            .finish()
    }
}
