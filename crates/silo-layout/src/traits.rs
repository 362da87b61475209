use std::io::Read;

use silo_types::{DirectoryLayout, PathKey};

use crate::error::LayoutResult;
use crate::hints::DigestHints;
use crate::source::PathSource;

/// Strategy for binding a byte stream to a storage path.
///
/// All implementations must satisfy these invariants:
/// - `derive` is single-use: one [`PathSource`] per store operation.
/// - A source's path and key are either both present or both absent —
///   never partially populated.
/// - `lookup` is a pure function of the key and the configured layout; it
///   never touches a stream and never recomputes a digest.
/// - The same key always resolves to the same path for the lifetime of the
///   configuration.
pub trait PathAlgorithm {
    /// The directory layout paths are derived under.
    fn layout(&self) -> &DirectoryLayout;

    /// The configured filename suffix, for callers that need to predict
    /// full names.
    fn suffix(&self) -> Option<&str> {
        self.layout().suffix.as_deref()
    }

    /// Bind a stream to a storage path.
    ///
    /// Depending on the strategy and the supplied hints, the returned
    /// source is resolved immediately or only after the caller fully
    /// drains it.
    fn derive<R: Read>(&self, stream: R, hints: &DigestHints) -> LayoutResult<PathSource<R>>;

    /// Re-derive the path for a previously recorded key.
    fn lookup(&self, key: &PathKey) -> LayoutResult<String>;
}
