use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DigestError, DigestResult};
use crate::hasher::{HasherFactory, StreamHasher};

/// What the pool does when the soft maximum is live and the borrow timeout
/// expires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExhaustionPolicy {
    /// Grow past the soft maximum rather than fail (liveness over bound).
    Elastic,
    /// Fail the borrow with a construction error.
    Strict,
}

/// Configuration for [`DigestPool`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Soft maximum number of live hasher instances.
    pub soft_max: usize,
    /// How long a borrower waits for a returned instance before the
    /// exhaustion policy applies.
    pub borrow_timeout: Duration,
    /// Behavior on exhaustion after the timeout.
    pub exhaustion: ExhaustionPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            soft_max: 8,
            borrow_timeout: Duration::from_millis(500),
            exhaustion: ExhaustionPolicy::Elastic,
        }
    }
}

struct PoolState {
    idle: Vec<Box<dyn StreamHasher>>,
    /// Instances in existence (idle + borrowed). Only ever incremented.
    live: usize,
}

/// Bounded, growable pool of reusable hasher instances.
///
/// Amortizes hasher construction on hot paths that hash many small inputs
/// (key hashing in particular). Safe for concurrent borrow/return from many
/// threads. Borrow returns a [`PooledHasher`] guard whose drop resets the
/// instance and returns it to the pool unconditionally — including on the
/// borrower's failure path.
pub struct DigestPool {
    factory: HasherFactory,
    config: PoolConfig,
    state: Mutex<PoolState>,
    returned: Condvar,
}

impl DigestPool {
    /// Create a pool constructing instances from the given factory.
    pub fn new(factory: HasherFactory, config: PoolConfig) -> Self {
        Self {
            factory,
            config,
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                live: 0,
            }),
            returned: Condvar::new(),
        }
    }

    /// The factory backing this pool.
    pub fn factory(&self) -> &HasherFactory {
        &self.factory
    }

    /// The active configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Instances currently idle in the pool.
    pub fn idle_count(&self) -> usize {
        self.state.lock().expect("pool lock poisoned").idle.len()
    }

    /// Instances in existence (idle + borrowed).
    pub fn live_count(&self) -> usize {
        self.state.lock().expect("pool lock poisoned").live
    }

    /// Borrow a hasher, blocking up to the configured timeout when the soft
    /// maximum is live and nothing is idle.
    ///
    /// On timeout the [`ExhaustionPolicy`] decides: `Elastic` grows the pool
    /// past the soft maximum, `Strict` fails with a construction error
    /// wrapping the cause.
    pub fn borrow(&self) -> DigestResult<PooledHasher<'_>> {
        self.borrow_within(self.config.borrow_timeout)
    }

    /// [`borrow`](Self::borrow) with an explicit wait bound for this call.
    pub fn borrow_within(&self, timeout: Duration) -> DigestResult<PooledHasher<'_>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock().expect("pool lock poisoned");
        loop {
            if let Some(hasher) = state.idle.pop() {
                return Ok(PooledHasher {
                    pool: self,
                    hasher: Some(hasher),
                });
            }
            if state.live < self.config.soft_max {
                state.live += 1;
                drop(state);
                return Ok(PooledHasher {
                    pool: self,
                    hasher: Some(self.factory.create()),
                });
            }

            let now = Instant::now();
            if now >= deadline {
                match self.config.exhaustion {
                    ExhaustionPolicy::Elastic => {
                        state.live += 1;
                        debug!(
                            algorithm = %self.factory.algorithm(),
                            live = state.live,
                            soft_max = self.config.soft_max,
                            "digest pool grown past soft maximum"
                        );
                        drop(state);
                        return Ok(PooledHasher {
                            pool: self,
                            hasher: Some(self.factory.create()),
                        });
                    }
                    ExhaustionPolicy::Strict => {
                        return Err(DigestError::Construction {
                            reason: format!(
                                "digest pool exhausted after {:?} ({} instances live, soft max {})",
                                timeout, state.live, self.config.soft_max
                            ),
                        });
                    }
                }
            }

            let (guard, _) = self
                .returned
                .wait_timeout(state, deadline - now)
                .expect("pool lock poisoned");
            state = guard;
        }
    }

    /// Reset an instance and hand it back. Called from the guard's drop.
    fn give_back(&self, mut hasher: Box<dyn StreamHasher>) {
        hasher.reset();
        // Return even through a poisoned lock: accounting must stay
        // consistent when a borrower panicked.
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.idle.push(hasher);
        drop(state);
        self.returned.notify_one();
    }
}

impl std::fmt::Debug for DigestPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestPool")
            .field("algorithm", &self.factory.algorithm())
            .field("idle", &self.idle_count())
            .field("live", &self.live_count())
            .finish()
    }
}

/// Scoped borrow of a pooled hasher.
///
/// Dereferences to [`StreamHasher`]. On drop the instance is reset and
/// returned to the pool, success or failure.
pub struct PooledHasher<'a> {
    pool: &'a DigestPool,
    hasher: Option<Box<dyn StreamHasher>>,
}

impl std::fmt::Debug for PooledHasher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledHasher")
            .field("pool", &self.pool)
            .field("present", &self.hasher.is_some())
            .finish()
    }
}

impl Deref for PooledHasher<'_> {
    type Target = dyn StreamHasher;

    fn deref(&self) -> &Self::Target {
        self.hasher.as_deref().expect("hasher present until drop")
    }
}

impl DerefMut for PooledHasher<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.hasher
            .as_deref_mut()
            .expect("hasher present until drop")
    }
}

impl Drop for PooledHasher<'_> {
    fn drop(&mut self) {
        if let Some(hasher) = self.hasher.take() {
            self.pool.give_back(hasher);
        }
    }
}
