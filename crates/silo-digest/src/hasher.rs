use sha2::digest::FixedOutputReset;
use sha2::{Digest, Sha256, Sha512};

use silo_types::{DigestAlgorithm, DigestValue};

use crate::error::{DigestError, DigestResult};

/// A reset-and-reusable streaming hash instance.
///
/// Implementations accumulate bytes via [`update`](Self::update) and produce
/// a [`DigestValue`] with [`finalize_reset`](Self::finalize_reset), which
/// also returns the instance to its initial state so it can be reused (this
/// is what makes pooling worthwhile on hot paths).
pub trait StreamHasher: Send {
    /// The algorithm this instance computes.
    fn algorithm(&self) -> DigestAlgorithm;

    /// Feed bytes into the running hash state.
    fn update(&mut self, data: &[u8]);

    /// Finalize the digest and reset the instance for reuse.
    fn finalize_reset(&mut self) -> DigestValue;

    /// Discard any accumulated state without producing a digest.
    fn reset(&mut self);
}

/// Construction capability for [`StreamHasher`] instances.
///
/// Unknown algorithm names fail here, at construction, so stream consumption
/// never discovers a bad configuration mid-drain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HasherFactory {
    algorithm: DigestAlgorithm,
}

impl HasherFactory {
    /// Factory for a known algorithm.
    pub const fn new(algorithm: DigestAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Factory from an algorithm name (case-insensitive).
    pub fn for_name(name: &str) -> DigestResult<Self> {
        let algorithm = DigestAlgorithm::parse(name)
            .map_err(|_| DigestError::UnsupportedAlgorithm(name.to_string()))?;
        Ok(Self::new(algorithm))
    }

    /// The algorithm this factory constructs hashers for.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Create a fresh hasher instance.
    pub fn create(&self) -> Box<dyn StreamHasher> {
        match self.algorithm {
            DigestAlgorithm::Blake3 => Box::new(Blake3Hasher(blake3::Hasher::new())),
            DigestAlgorithm::Sha256 => Box::new(Sha2Hasher::<Sha256>::default()),
            DigestAlgorithm::Sha512 => Box::new(Sha2Hasher::<Sha512>::default()),
        }
    }

    /// Hash a complete byte slice with a throwaway instance.
    pub fn digest(&self, data: &[u8]) -> DigestValue {
        let mut hasher = self.create();
        hasher.update(data);
        hasher.finalize_reset()
    }
}

struct Blake3Hasher(blake3::Hasher);

impl StreamHasher for Blake3Hasher {
    fn algorithm(&self) -> DigestAlgorithm {
        DigestAlgorithm::Blake3
    }

    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize_reset(&mut self) -> DigestValue {
        let bytes = self.0.finalize().as_bytes().to_vec();
        self.0.reset();
        DigestValue::new(DigestAlgorithm::Blake3, bytes)
            .expect("BLAKE3 output length is fixed at 32 bytes")
    }

    fn reset(&mut self) {
        self.0.reset();
    }
}

trait Sha2Algorithm {
    const ALGORITHM: DigestAlgorithm;
}

impl Sha2Algorithm for Sha256 {
    const ALGORITHM: DigestAlgorithm = DigestAlgorithm::Sha256;
}

impl Sha2Algorithm for Sha512 {
    const ALGORITHM: DigestAlgorithm = DigestAlgorithm::Sha512;
}

#[derive(Default)]
struct Sha2Hasher<D>(D);

impl<D> StreamHasher for Sha2Hasher<D>
where
    D: Digest + FixedOutputReset + Sha2Algorithm + Send,
{
    fn algorithm(&self) -> DigestAlgorithm {
        D::ALGORITHM
    }

    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finalize_reset(&mut self) -> DigestValue {
        let bytes = Digest::finalize_reset(&mut self.0).to_vec();
        DigestValue::new(D::ALGORITHM, bytes)
            .expect("SHA-2 output length is fixed by the variant")
    }

    fn reset(&mut self) {
        Digest::reset(&mut self.0);
    }
}
