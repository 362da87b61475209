use std::io::{self, Read};
use std::sync::{Arc, OnceLock};

use silo_digest::DigestReader;
use silo_types::{DigestValue, PathKey};

/// A fully resolved storage target: key, relative path, and (when one was
/// computed or supplied) the content digest.
#[derive(Clone, Debug)]
pub(crate) struct ResolvedTarget {
    pub key: PathKey,
    pub path: String,
    pub digest: Option<DigestValue>,
}

enum SourceStream<R> {
    /// Path known up front; the stream passes through untouched.
    Plain(R),
    /// Path pending; the stream is digested in flight.
    Digesting(DigestReader<R>),
}

enum Resolution {
    Ready(ResolvedTarget),
    /// Filled by the digest-completion listener once the stream is drained.
    Pending(Arc<OnceLock<ResolvedTarget>>),
}

/// A single-use binding of a byte stream to a storage path.
///
/// Created per store operation by a
/// [`PathAlgorithm`](crate::traits::PathAlgorithm). The caller drains the
/// stream (this type implements [`Read`]), then reads the resolved
/// [`path_name`](Self::path_name) and [`path_key`](Self::path_key).
///
/// Resolution is all-or-nothing: both accessors return `Some` once the path
/// is derivable — immediately for key-addressed sources and trusted-hint
/// content sources, only after full drainage otherwise — and both return
/// `None` before that. There is never a partial or stale value.
pub struct PathSource<R> {
    stream: SourceStream<R>,
    resolution: Resolution,
}

impl<R: Read> PathSource<R> {
    /// A source whose target was known before any byte was read.
    pub(crate) fn resolved(stream: R, target: ResolvedTarget) -> Self {
        Self {
            stream: SourceStream::Plain(stream),
            resolution: Resolution::Ready(target),
        }
    }

    /// A source that resolves when its wrapped reader finishes digesting.
    pub(crate) fn pending(reader: DigestReader<R>, cell: Arc<OnceLock<ResolvedTarget>>) -> Self {
        Self {
            stream: SourceStream::Digesting(reader),
            resolution: Resolution::Pending(cell),
        }
    }

    fn target(&self) -> Option<&ResolvedTarget> {
        match &self.resolution {
            Resolution::Ready(target) => Some(target),
            Resolution::Pending(cell) => cell.get(),
        }
    }

    /// Returns `true` once the path and key are derivable.
    pub fn is_resolved(&self) -> bool {
        self.target().is_some()
    }

    /// The stable key re-deriving this source's path, once resolved.
    pub fn path_key(&self) -> Option<&PathKey> {
        self.target().map(|t| &t.key)
    }

    /// The relative storage path, once resolved.
    pub fn path_name(&self) -> Option<&str> {
        self.target().map(|t| t.path.as_str())
    }

    /// The content digest, when one was computed in flight or supplied as a
    /// trusted hint. Key-addressed sources carry none.
    pub fn content_digest(&self) -> Option<&DigestValue> {
        self.target().and_then(|t| t.digest.as_ref())
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> R {
        match self.stream {
            SourceStream::Plain(inner) => inner,
            SourceStream::Digesting(reader) => reader.into_inner(),
        }
    }
}

impl<R: Read> Read for PathSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.stream {
            SourceStream::Plain(inner) => inner.read(buf),
            SourceStream::Digesting(reader) => reader.read(buf),
        }
    }
}

impl<R> std::fmt::Debug for PathSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let target = match &self.resolution {
            Resolution::Ready(target) => Some(target),
            Resolution::Pending(cell) => cell.get(),
        };
        f.debug_struct("PathSource")
            .field("resolved", &target.is_some())
            .field("path", &target.map(|t| t.path.as_str()))
            .finish()
    }
}
