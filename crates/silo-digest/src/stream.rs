use std::io::{self, Read, Write};

use silo_types::DigestValue;

use crate::error::DigestResult;
use crate::hasher::StreamHasher;
use crate::notifier::{DigestListener, DigestNotifier};

/// Stream lifecycle: `Open -> Finished`, no further transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StreamState {
    Open,
    Finished,
}

/// A reader that feeds every byte it yields through a hash function.
///
/// The digest is finalized exactly once — on natural end-of-stream or on an
/// explicit [`close`](Self::close), whichever comes first — and dispatched
/// synchronously to the attached listeners in registration order. A single
/// instance is single-reader: no internal locking is provided.
pub struct DigestReader<R> {
    inner: R,
    hasher: Box<dyn StreamHasher>,
    notifier: DigestNotifier,
    digest: Option<DigestValue>,
    state: StreamState,
}

impl<R: Read> DigestReader<R> {
    /// Wrap a reader with a live hasher.
    pub fn new(inner: R, hasher: Box<dyn StreamHasher>) -> Self {
        Self {
            inner,
            hasher,
            notifier: DigestNotifier::new(),
            digest: None,
            state: StreamState::Open,
        }
    }

    /// Register a completion listener. Must be called before draining.
    pub fn attach(&mut self, listener: impl DigestListener + 'static) {
        self.notifier.attach(listener);
    }

    /// The finalized digest, once end-of-stream or close has been reached.
    pub fn digest(&self) -> Option<&DigestValue> {
        self.digest.as_ref()
    }

    /// Finalize the digest over the bytes read so far and dispatch it.
    ///
    /// Idempotent: repeated calls never re-dispatch. A listener error
    /// propagates; the wrapped reader needs no release action beyond drop.
    pub fn close(&mut self) -> DigestResult<()> {
        self.finish()
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn finish(&mut self) -> DigestResult<()> {
        if self.state == StreamState::Finished {
            return Ok(());
        }
        self.state = StreamState::Finished;
        let digest = self.hasher.finalize_reset();
        let dispatch = self.notifier.notify(&digest);
        self.digest = Some(digest);
        dispatch
    }
}

impl<R: Read> Read for DigestReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if self.state == StreamState::Open {
            if n > 0 {
                self.hasher.update(&buf[..n]);
            } else if !buf.is_empty() {
                // Natural end-of-stream: finalize and notify on this thread.
                self.finish().map_err(io::Error::other)?;
            }
        }
        Ok(n)
    }
}

impl<R> std::fmt::Debug for DigestReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestReader")
            .field("algorithm", &self.hasher.algorithm())
            .field("state", &self.state)
            .finish()
    }
}

/// A writer that feeds every byte written through a hash function.
///
/// [`close`](Self::close) finalizes the digest, dispatches it to listeners,
/// and flushes the wrapped writer on every exit path — including when a
/// listener fails. Dropping an unclosed writer performs a best-effort close.
pub struct DigestWriter<W: Write> {
    inner: W,
    hasher: Box<dyn StreamHasher>,
    notifier: DigestNotifier,
    digest: Option<DigestValue>,
    state: StreamState,
}

impl<W: Write> DigestWriter<W> {
    /// Wrap a writer with a live hasher.
    pub fn new(inner: W, hasher: Box<dyn StreamHasher>) -> Self {
        Self {
            inner,
            hasher,
            notifier: DigestNotifier::new(),
            digest: None,
            state: StreamState::Open,
        }
    }

    /// Register a completion listener. Must be called before closing.
    pub fn attach(&mut self, listener: impl DigestListener + 'static) {
        self.notifier.attach(listener);
    }

    /// The finalized digest, once closed.
    pub fn digest(&self) -> Option<&DigestValue> {
        self.digest.as_ref()
    }

    /// Finalize the digest, dispatch it, and flush the wrapped writer.
    ///
    /// Idempotent: repeated calls never re-dispatch. The flush happens
    /// regardless of listener outcome; a listener error takes precedence in
    /// the returned result.
    pub fn close(&mut self) -> DigestResult<()> {
        if self.state == StreamState::Finished {
            return Ok(());
        }
        self.state = StreamState::Finished;
        let digest = self.hasher.finalize_reset();
        let dispatch = self.notifier.notify(&digest);
        self.digest = Some(digest);
        // Release the underlying stream on every exit path.
        let release = self.inner.flush();
        dispatch?;
        release?;
        Ok(())
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        if self.state == StreamState::Open && n > 0 {
            // Hash only what the underlying writer accepted.
            self.hasher.update(&buf[..n]);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> Drop for DigestWriter<W> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl<W: Write> std::fmt::Debug for DigestWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestWriter")
            .field("algorithm", &self.hasher.algorithm())
            .field("state", &self.state)
            .finish()
    }
}
