use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use tracing::debug;

use crate::config::GateConfig;
use crate::error::{GateError, GateResult};

/// Shared permit accounting: a count of free permits plus a wakeup for
/// blocked submitters.
struct GateShared {
    free: Mutex<usize>,
    freed: Condvar,
}

/// Holds one permit from admission until task completion.
///
/// Dropping the guard releases the permit — on normal return, on panic, and
/// even through a poisoned lock — so release happens exactly once on every
/// task exit path.
struct PermitGuard {
    shared: Arc<GateShared>,
}

impl Drop for PermitGuard {
    fn drop(&mut self) {
        let mut free = match self.shared.free.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *free += 1;
        drop(free);
        self.shared.freed.notify_one();
    }
}

/// Bounded-admission concurrency control for ingestion work.
///
/// The gate holds `max_concurrency` permits. [`submit`](Self::submit)
/// acquires one — blocking the caller while none are free — then runs the
/// task on its own on-demand worker thread. "Admitted" and "executing" are
/// equivalent: there is no internal queue, so at most `max_concurrency`
/// tasks execute at any instant and excess submitters simply wait.
///
/// No ordering is guaranteed among blocked submitters, and no
/// cancellation or timeout is provided on admission; callers needing one
/// must build it at the call site. The gate has no terminal state and is
/// reused for the process lifetime.
pub struct WorkerGate {
    shared: Arc<GateShared>,
    config: GateConfig,
}

impl WorkerGate {
    /// Create a gate with the given configuration.
    pub fn new(config: GateConfig) -> GateResult<Self> {
        if config.max_concurrency == 0 {
            return Err(GateError::Config(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            shared: Arc::new(GateShared {
                free: Mutex::new(config.max_concurrency),
                freed: Condvar::new(),
            }),
            config,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// The configured concurrency bound.
    pub fn max_concurrency(&self) -> usize {
        self.config.max_concurrency
    }

    /// Permits currently free. Advisory: another submitter may take one
    /// between this call and a subsequent `submit`.
    pub fn available_permits(&self) -> usize {
        *self.shared.free.lock().expect("gate lock poisoned")
    }

    /// Acquire a permit and execute `task` on its own worker thread.
    ///
    /// Blocks the calling thread while no permit is free. The permit is
    /// released automatically when the task finishes, success or failure.
    /// A failed blocking wait rejects the submission with
    /// [`GateError::Admission`] rather than admitting it.
    pub fn submit<F, T>(&self, task: F) -> GateResult<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.acquire()?;
        let permit = PermitGuard {
            shared: Arc::clone(&self.shared),
        };
        debug!(worker = %self.config.worker_name, "task admitted");

        let spawned = thread::Builder::new()
            .name(self.config.worker_name.clone())
            .spawn(move || {
                // The guard rides with the task: released on every exit
                // path, panic included.
                let _permit = permit;
                task()
            });
        match spawned {
            Ok(inner) => Ok(TaskHandle { inner }),
            // The closure was dropped by the failed spawn, which already
            // released the permit through the guard.
            Err(err) => Err(GateError::Spawn(err)),
        }
    }

    fn acquire(&self) -> GateResult<()> {
        let mut free = self
            .shared
            .free
            .lock()
            .map_err(|_| GateError::Admission("gate lock poisoned".to_string()))?;
        while *free == 0 {
            free = self
                .shared
                .freed
                .wait(free)
                .map_err(|_| GateError::Admission("gate lock poisoned while waiting".to_string()))?;
        }
        *free -= 1;
        Ok(())
    }
}

impl std::fmt::Debug for WorkerGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerGate")
            .field("max_concurrency", &self.config.max_concurrency)
            .field("available", &self.available_permits())
            .finish()
    }
}

/// Handle to a submitted task.
pub struct TaskHandle<T> {
    inner: thread::JoinHandle<T>,
}

impl<T> TaskHandle<T> {
    /// Wait for the task and return its result.
    ///
    /// A panicking task yields [`GateError::TaskPanicked`]; its permit has
    /// already been released.
    pub fn join(self) -> GateResult<T> {
        self.inner.join().map_err(|_| GateError::TaskPanicked)
    }

    /// Returns `true` once the task has finished executing.
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("finished", &self.inner.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;

    fn wait_until(deadline_ms: u64, predicate: impl Fn() -> bool) -> bool {
        for _ in 0..deadline_ms {
            if predicate() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        predicate()
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    #[test]
    fn zero_concurrency_is_a_config_error() {
        let err = WorkerGate::new(GateConfig::with_concurrency(0)).unwrap_err();
        assert!(matches!(err, GateError::Config(_)));
    }

    #[test]
    fn fresh_gate_has_all_permits_free() {
        let gate = WorkerGate::new(GateConfig::with_concurrency(3)).unwrap();
        assert_eq!(gate.max_concurrency(), 3);
        assert_eq!(gate.available_permits(), 3);
    }

    // -----------------------------------------------------------------------
    // Task execution and results
    // -----------------------------------------------------------------------

    #[test]
    fn submit_runs_task_and_returns_result() {
        let gate = WorkerGate::new(GateConfig::default()).unwrap();
        let handle = gate.submit(|| 6 * 7).unwrap();
        assert_eq!(handle.join().unwrap(), 42);
    }

    #[test]
    fn permits_return_after_completion() {
        let gate = WorkerGate::new(GateConfig::with_concurrency(2)).unwrap();
        for _ in 0..5 {
            gate.submit(|| ()).unwrap().join().unwrap();
        }
        assert_eq!(gate.available_permits(), 2);
    }

    #[test]
    fn panicking_task_releases_its_permit() {
        let gate = WorkerGate::new(GateConfig::with_concurrency(1)).unwrap();
        let handle = gate.submit(|| panic!("worker died")).unwrap();
        assert!(matches!(handle.join(), Err(GateError::TaskPanicked)));

        assert!(wait_until(1000, || gate.available_permits() == 1));
        // The gate is still usable.
        assert_eq!(gate.submit(|| 1).unwrap().join().unwrap(), 1);
    }

    // -----------------------------------------------------------------------
    // Concurrency bound
    // -----------------------------------------------------------------------

    #[test]
    fn at_most_n_tasks_execute_concurrently() {
        let gate = Arc::new(WorkerGate::new(GateConfig::with_concurrency(2)).unwrap());
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let third_started = Arc::new(AtomicBool::new(false));

        let blocking_task = |rx: mpsc::Receiver<()>, started: Option<Arc<AtomicBool>>| {
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            move || {
                if let Some(flag) = started {
                    flag.store(true, Ordering::SeqCst);
                }
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                rx.recv().expect("release signal");
                current.fetch_sub(1, Ordering::SeqCst);
            }
        };

        let (tx1, rx1) = mpsc::channel();
        let (tx2, rx2) = mpsc::channel();
        let (tx3, rx3) = mpsc::channel();

        let h1 = gate.submit(blocking_task(rx1, None)).unwrap();
        let h2 = gate.submit(blocking_task(rx2, None)).unwrap();
        assert!(wait_until(1000, || current.load(Ordering::SeqCst) == 2));

        // The third submission blocks its submitter until a permit frees up.
        let task3 = blocking_task(rx3, Some(Arc::clone(&third_started)));
        let gate_clone = Arc::clone(&gate);
        let submitter = thread::spawn(move || {
            gate_clone.submit(task3).unwrap().join().unwrap();
        });

        thread::sleep(Duration::from_millis(100));
        assert!(!third_started.load(Ordering::SeqCst));
        assert_eq!(current.load(Ordering::SeqCst), 2);

        // Releasing one running task admits the third.
        tx1.send(()).unwrap();
        assert!(wait_until(1000, || third_started.load(Ordering::SeqCst)));

        tx2.send(()).unwrap();
        tx3.send(()).unwrap();
        h1.join().unwrap();
        h2.join().unwrap();
        submitter.join().unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(gate.available_permits(), 2);
    }

    #[test]
    fn single_permit_gate_serializes_tasks() {
        let gate = Arc::new(WorkerGate::new(GateConfig::with_concurrency(1)).unwrap());
        let current = Arc::new(AtomicUsize::new(0));
        let overlap = Arc::new(AtomicBool::new(false));

        let submitters: Vec<_> = (0..4)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let current = Arc::clone(&current);
                let overlap = Arc::clone(&overlap);
                thread::spawn(move || {
                    let current_inner = Arc::clone(&current);
                    let overlap_inner = Arc::clone(&overlap);
                    gate.submit(move || {
                        if current_inner.fetch_add(1, Ordering::SeqCst) > 0 {
                            overlap_inner.store(true, Ordering::SeqCst);
                        }
                        thread::sleep(Duration::from_millis(10));
                        current_inner.fetch_sub(1, Ordering::SeqCst);
                    })
                    .unwrap()
                    .join()
                    .unwrap();
                })
            })
            .collect();

        for s in submitters {
            s.join().unwrap();
        }
        assert!(!overlap.load(Ordering::SeqCst));
        assert_eq!(gate.available_permits(), 1);
    }

    #[test]
    fn gate_is_reusable_after_heavy_churn() {
        let gate = Arc::new(WorkerGate::new(GateConfig::with_concurrency(3)).unwrap());
        let completed = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..30)
            .map(|_| {
                let completed = Arc::clone(&completed);
                gate.submit(move || {
                    completed.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap()
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(completed.load(Ordering::SeqCst), 30);
        assert_eq!(gate.available_permits(), 3);
    }

    #[test]
    fn worker_threads_carry_the_configured_name() {
        let mut config = GateConfig::with_concurrency(1);
        config.worker_name = "ingest-worker".to_string();
        let gate = WorkerGate::new(config).unwrap();
        let name = gate
            .submit(|| thread::current().name().map(str::to_string))
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(name.as_deref(), Some("ingest-worker"));
    }
}
