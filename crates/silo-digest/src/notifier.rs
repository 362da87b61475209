use silo_types::DigestValue;

use crate::error::DigestResult;

/// A one-shot observer of a finalized digest.
///
/// Implemented for any `FnMut(&DigestValue) -> DigestResult<()> + Send`
/// closure, so most call sites just attach a closure.
pub trait DigestListener: Send {
    /// Called exactly once with the finalized digest.
    ///
    /// Returning an error aborts dispatch of later-registered listeners in
    /// the same pass and propagates to whoever triggered finalization.
    fn digest_computed(&mut self, digest: &DigestValue) -> DigestResult<()>;
}

impl<F> DigestListener for F
where
    F: FnMut(&DigestValue) -> DigestResult<()> + Send,
{
    fn digest_computed(&mut self, digest: &DigestValue) -> DigestResult<()> {
        self(digest)
    }
}

/// Dispatch state: a notifier fires at most once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NotifierState {
    Armed,
    Notified,
}

/// One-shot listener registry and dispatcher.
///
/// Listeners are invoked synchronously, in registration order, on the thread
/// that triggers [`notify`](Self::notify). The state machine is
/// `Armed -> Notified` with no further transitions: once a dispatch pass has
/// started — even one aborted by a failing listener — later calls are no-ops.
pub struct DigestNotifier {
    listeners: Vec<Box<dyn DigestListener>>,
    state: NotifierState,
}

impl DigestNotifier {
    /// Create an empty, armed notifier.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            state: NotifierState::Armed,
        }
    }

    /// Register a listener. Position in the registration order determines
    /// dispatch order.
    pub fn attach(&mut self, listener: impl DigestListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Returns `true` once a dispatch pass has run.
    pub fn is_notified(&self) -> bool {
        self.state == NotifierState::Notified
    }

    /// Dispatch the digest to all listeners, in order, at most once.
    ///
    /// Fail-fast: the first listener error stops the pass; listeners already
    /// invoked keep their observed value, listeners after the failure never
    /// fire. Repeated calls after the first pass return `Ok(())` without
    /// dispatching.
    pub fn notify(&mut self, digest: &DigestValue) -> DigestResult<()> {
        if self.state == NotifierState::Notified {
            return Ok(());
        }
        // Transition before dispatch so a failing pass is never retried.
        self.state = NotifierState::Notified;
        for listener in &mut self.listeners {
            listener.digest_computed(digest)?;
        }
        Ok(())
    }
}

impl Default for DigestNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DigestNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestNotifier")
            .field("listeners", &self.listeners.len())
            .field("state", &self.state)
            .finish()
    }
}
