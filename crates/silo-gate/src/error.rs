use thiserror::Error;

/// Errors from gate construction and task submission.
#[derive(Debug, Error)]
pub enum GateError {
    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The blocking wait for a permit failed. The submission is rejected
    /// rather than silently admitted.
    #[error("admission failed: {0}")]
    Admission(String),

    /// The worker thread could not be spawned. The permit acquired for the
    /// task has already been released.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The task panicked. Its permit was still released.
    #[error("task panicked")]
    TaskPanicked,
}

/// Result alias for gate operations.
pub type GateResult<T> = Result<T, GateError>;
