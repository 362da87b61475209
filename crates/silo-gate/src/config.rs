use serde::{Deserialize, Serialize};

/// Configuration for [`WorkerGate`](crate::gate::WorkerGate).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateConfig {
    /// Maximum number of concurrently executing tasks. Must be non-zero.
    pub max_concurrency: usize,
    /// Name given to spawned worker threads.
    pub worker_name: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            worker_name: "silo-worker".to_string(),
        }
    }
}

impl GateConfig {
    /// A config bounding execution to `max_concurrency` tasks.
    pub fn with_concurrency(max_concurrency: usize) -> Self {
        Self {
            max_concurrency,
            ..Default::default()
        }
    }
}
