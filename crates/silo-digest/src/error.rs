use thiserror::Error;

/// Errors from digest computation and hasher management.
#[derive(Debug, Error)]
pub enum DigestError {
    /// Unknown or unsupported algorithm name. Raised at construction time,
    /// never once bytes are flowing.
    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A hasher instance could not be obtained (e.g. pool exhaustion under a
    /// strict bound).
    #[error("hasher construction failed: {reason}")]
    Construction { reason: String },

    /// A completion listener rejected the computed digest. Dispatch of
    /// later-registered listeners in the same pass was aborted.
    #[error("digest listener failed: {0}")]
    Listener(String),

    /// I/O error from the wrapped stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for digest operations.
pub type DigestResult<T> = Result<T, DigestError>;
