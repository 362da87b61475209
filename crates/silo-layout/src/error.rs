use thiserror::Error;

use silo_digest::DigestError;

/// Errors from path derivation and layout configuration.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The layout configuration is unusable for the chosen algorithm.
    /// Raised at algorithm construction, never during stream consumption.
    #[error("invalid directory layout: {0}")]
    InvalidLayout(String),

    /// A key does not carry enough hex characters for the configured
    /// fan-out.
    #[error("path key too short for layout: need at least {needed} hex characters, got {actual}")]
    KeyTooShort { needed: usize, actual: usize },

    /// Digest computation or hasher acquisition failed.
    #[error("digest error: {0}")]
    Digest(#[from] DigestError),
}

/// Result alias for layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;
