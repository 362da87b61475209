use std::io::Read;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use silo_digest::{DigestError, DigestReader, HasherFactory};
use silo_types::{DigestAlgorithm, DigestValue, DirectoryLayout, PathKey};

use crate::error::LayoutResult;
use crate::fanout::{self, fan_out};
use crate::hints::DigestHints;
use crate::source::{PathSource, ResolvedTarget};
use crate::traits::PathAlgorithm;

/// Content-addressed path derivation: the storage location is a fan-out of
/// the digest of the stored bytes themselves.
///
/// Without a hint, the returned source wraps the stream in a
/// [`DigestReader`]; the path becomes readable once the caller has fully
/// drained it. With a trusted hint for the configured algorithm the path is
/// resolved immediately and the stream passes through unwrapped — the hint
/// is *not* verified against the content (explicit trust boundary;
/// verification is the caller's responsibility).
///
/// Identical content always derives the identical key, so two writes of the
/// same bytes target the same path and deduplicate naturally.
pub struct ContentAddressed {
    factory: HasherFactory,
    layout: DirectoryLayout,
}

impl ContentAddressed {
    /// Create a content-addressed algorithm.
    ///
    /// Fails if the layout's fan-out cannot be satisfied by the algorithm's
    /// digest length.
    pub fn new(algorithm: DigestAlgorithm, layout: DirectoryLayout) -> LayoutResult<Self> {
        fanout::validate(&layout, algorithm)?;
        Ok(Self {
            factory: HasherFactory::new(algorithm),
            layout,
        })
    }

    /// Create from an algorithm name (case-insensitive). Unknown names fail
    /// here, at construction.
    pub fn for_name(name: &str, layout: DirectoryLayout) -> LayoutResult<Self> {
        let factory = HasherFactory::for_name(name)?;
        fanout::validate(&layout, factory.algorithm())?;
        Ok(Self { factory, layout })
    }

    /// The configured digest algorithm.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.factory.algorithm()
    }

    fn target_for(&self, digest: DigestValue) -> LayoutResult<ResolvedTarget> {
        let key = PathKey::from_digest(&digest);
        let path = fan_out(key.as_str(), &self.layout)?;
        Ok(ResolvedTarget {
            key,
            path,
            digest: Some(digest),
        })
    }
}

impl PathAlgorithm for ContentAddressed {
    fn layout(&self) -> &DirectoryLayout {
        &self.layout
    }

    fn derive<R: Read>(&self, stream: R, hints: &DigestHints) -> LayoutResult<PathSource<R>> {
        // Trusted hint: the path is known now and nothing gets wrapped.
        if let Some(digest) = hints.get(self.factory.algorithm()) {
            debug!(
                algorithm = %self.factory.algorithm(),
                digest = %digest.short_hex(),
                "trusted digest hint supplied; skipping recomputation"
            );
            return Ok(PathSource::resolved(stream, self.target_for(digest)?));
        }

        let cell: Arc<OnceLock<ResolvedTarget>> = Arc::new(OnceLock::new());
        let mut reader = DigestReader::new(stream, self.factory.create());
        let listener_cell = Arc::clone(&cell);
        let layout = self.layout.clone();
        reader.attach(move |digest: &DigestValue| {
            let key = PathKey::from_digest(digest);
            let path = fan_out(key.as_str(), &layout)
                .map_err(|e| DigestError::Listener(e.to_string()))?;
            let _ = listener_cell.set(ResolvedTarget {
                key,
                path,
                digest: Some(digest.clone()),
            });
            Ok(())
        });
        Ok(PathSource::pending(reader, cell))
    }

    fn lookup(&self, key: &PathKey) -> LayoutResult<String> {
        fan_out(key.as_str(), &self.layout)
    }
}

impl std::fmt::Debug for ContentAddressed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentAddressed")
            .field("algorithm", &self.factory.algorithm())
            .field("layout", &self.layout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read as _, Write as _};

    use silo_types::TypeError;

    use super::*;

    fn algorithm() -> ContentAddressed {
        ContentAddressed::new(DigestAlgorithm::Sha256, DirectoryLayout::new(1, 2)).unwrap()
    }

    fn drain<R: Read>(source: &mut PathSource<R>) -> Vec<u8> {
        let mut out = Vec::new();
        source.read_to_end(&mut out).unwrap();
        out
    }

    // -----------------------------------------------------------------------
    // Lazy resolution
    // -----------------------------------------------------------------------

    #[test]
    fn path_is_null_until_drained() {
        let alg = algorithm();
        let mut source = alg
            .derive(Cursor::new(b"hello world".to_vec()), &DigestHints::new())
            .unwrap();

        assert!(!source.is_resolved());
        assert!(source.path_name().is_none());
        assert!(source.path_key().is_none());

        let bytes = drain(&mut source);
        assert_eq!(bytes, b"hello world");
        assert!(source.is_resolved());
        assert!(source.path_name().is_some());
        assert!(source.path_key().is_some());
    }

    #[test]
    fn partially_drained_source_stays_unresolved() {
        let alg = algorithm();
        let mut source = alg
            .derive(Cursor::new(vec![7u8; 1024]), &DigestHints::new())
            .unwrap();
        let mut buf = [0u8; 100];
        source.read(&mut buf).unwrap();
        assert!(!source.is_resolved());
    }

    #[test]
    fn resolved_path_matches_content_digest() {
        let alg = algorithm();
        let factory = HasherFactory::new(DigestAlgorithm::Sha256);
        let expected = factory.digest(b"payload");
        let expected_key = PathKey::from_digest(&expected);

        let mut source = alg
            .derive(Cursor::new(b"payload".to_vec()), &DigestHints::new())
            .unwrap();
        drain(&mut source);

        assert_eq!(source.path_key(), Some(&expected_key));
        assert_eq!(source.content_digest(), Some(&expected));
        let hex = expected_key.as_str();
        assert_eq!(
            source.path_name().unwrap(),
            format!("{}/{}/{}", &hex[0..2], &hex[2..4], hex)
        );
    }

    // -----------------------------------------------------------------------
    // lookup() purity and stability
    // -----------------------------------------------------------------------

    #[test]
    fn lookup_before_and_after_drain_agree() {
        let alg = algorithm();
        let factory = HasherFactory::new(DigestAlgorithm::Sha256);
        let key = PathKey::from_digest(&factory.digest(b"stable bytes"));

        // Before any stream exists.
        let before = alg.lookup(&key).unwrap();

        let mut source = alg
            .derive(Cursor::new(b"stable bytes".to_vec()), &DigestHints::new())
            .unwrap();
        drain(&mut source);

        let after = alg.lookup(source.path_key().unwrap()).unwrap();
        assert_eq!(before, after);
        assert_eq!(source.path_name(), Some(before.as_str()));
    }

    #[test]
    fn identical_content_from_distinct_streams_dedups() {
        let alg = algorithm();
        let mut a = alg
            .derive(Cursor::new(b"same bytes".to_vec()), &DigestHints::new())
            .unwrap();
        let mut b = alg
            .derive(Cursor::new(b"same bytes".to_vec()), &DigestHints::new())
            .unwrap();
        drain(&mut a);
        drain(&mut b);
        assert_eq!(a.path_key(), b.path_key());
        assert_eq!(a.path_name(), b.path_name());
    }

    #[test]
    fn different_content_lands_on_different_paths() {
        let alg = algorithm();
        let mut a = alg
            .derive(Cursor::new(b"aaa".to_vec()), &DigestHints::new())
            .unwrap();
        let mut b = alg
            .derive(Cursor::new(b"bbb".to_vec()), &DigestHints::new())
            .unwrap();
        drain(&mut a);
        drain(&mut b);
        assert_ne!(a.path_name(), b.path_name());
    }

    // -----------------------------------------------------------------------
    // Trusted hints
    // -----------------------------------------------------------------------

    #[test]
    fn trusted_hint_resolves_immediately() {
        let alg = algorithm();
        let factory = HasherFactory::new(DigestAlgorithm::Sha256);
        let digest = factory.digest(b"known content");
        let hints = DigestHints::new().with(DigestAlgorithm::Sha256, digest.as_bytes().to_vec());

        let source = alg
            .derive(Cursor::new(b"known content".to_vec()), &hints)
            .unwrap();
        // Resolved before a single byte is read.
        assert!(source.is_resolved());
        assert_eq!(source.path_key(), Some(&PathKey::from_digest(&digest)));
        assert_eq!(source.content_digest(), Some(&digest));
    }

    #[test]
    fn hint_is_consumed_not_verified() {
        let alg = algorithm();
        // A digest of entirely different content: the trust boundary means
        // it is accepted as-is.
        let factory = HasherFactory::new(DigestAlgorithm::Sha256);
        let wrong = factory.digest(b"something else entirely");
        let hints = DigestHints::new().with(DigestAlgorithm::Sha256, wrong.as_bytes().to_vec());

        let mut source = alg
            .derive(Cursor::new(b"actual content".to_vec()), &hints)
            .unwrap();
        let bytes = drain(&mut source);
        assert_eq!(bytes, b"actual content");
        // Path derived from the hint, not the content.
        assert_eq!(source.path_key(), Some(&PathKey::from_digest(&wrong)));
    }

    #[test]
    fn hint_for_other_algorithm_is_ignored() {
        let alg = algorithm();
        let hints = DigestHints::new().with(DigestAlgorithm::Blake3, vec![0x11; 32]);
        let source = alg
            .derive(Cursor::new(b"data".to_vec()), &hints)
            .unwrap();
        // Falls back to streaming resolution.
        assert!(!source.is_resolved());
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    #[test]
    fn unknown_algorithm_name_fails_at_construction() {
        let err = ContentAddressed::for_name("md5", DirectoryLayout::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::LayoutError::Digest(DigestError::UnsupportedAlgorithm(_))
        ));
        // And known names succeed.
        assert!(ContentAddressed::for_name("SHA-256", DirectoryLayout::default()).is_ok());
        assert!(matches!(
            DigestAlgorithm::parse("md5"),
            Err(TypeError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn oversized_fanout_fails_at_construction() {
        let layout = DirectoryLayout::new(4, 20);
        assert!(ContentAddressed::new(DigestAlgorithm::Sha256, layout).is_err());
    }

    #[test]
    fn suffix_appears_in_derived_path() {
        let layout = DirectoryLayout::new(1, 1).with_suffix(".blob");
        let alg = ContentAddressed::new(DigestAlgorithm::Sha256, layout).unwrap();
        assert_eq!(alg.suffix(), Some(".blob"));

        let mut source = alg
            .derive(Cursor::new(b"x".to_vec()), &DigestHints::new())
            .unwrap();
        drain(&mut source);
        assert!(source.path_name().unwrap().ends_with(".blob"));
    }

    // -----------------------------------------------------------------------
    // File streams
    // -----------------------------------------------------------------------

    #[test]
    fn derives_from_a_file_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        let payload: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&payload)
            .unwrap();

        let alg = algorithm();
        let file = std::fs::File::open(&path).unwrap();
        let mut source = alg.derive(file, &DigestHints::new()).unwrap();
        let bytes = drain(&mut source);

        assert_eq!(bytes.len(), payload.len());
        let factory = HasherFactory::new(DigestAlgorithm::Sha256);
        let expected = PathKey::from_digest(&factory.digest(&payload));
        assert_eq!(source.path_key(), Some(&expected));
    }
}
