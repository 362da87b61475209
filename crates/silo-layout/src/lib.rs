//! Addressable storage path derivation for silo.
//!
//! A storage writer hands this crate a byte stream; it gets back a
//! [`PathSource`]: the same stream (possibly wrapped to compute a digest in
//! flight) bound to a relative storage path and a stable [`PathKey`] that
//! re-derives that path later without touching the bytes again.
//!
//! Two addressing strategies implement the [`PathAlgorithm`] trait:
//!
//! - [`ContentAddressed`] — the path is a fan-out of the content digest, so
//!   it is known only after the stream has been fully drained (or
//!   immediately, when the caller supplies a trusted digest hint).
//!   Identical content always lands on the identical path, which gives
//!   natural deduplication.
//! - [`KeyAddressed`] — the path is a fan-out of the digest of a caller
//!   key string, so it is known before any byte is read. Identical content
//!   under different keys lands on different paths; a given key always
//!   reproduces the same path, enabling deterministic overwrite.
//!
//! Both share one [`fan_out`] helper that bounds per-directory entry counts
//! deterministically.

pub mod content;
pub mod error;
pub mod fanout;
pub mod hints;
pub mod keyed;
pub mod source;
pub mod traits;

pub use content::ContentAddressed;
pub use error::{LayoutError, LayoutResult};
pub use fanout::fan_out;
pub use hints::DigestHints;
pub use keyed::KeyAddressed;
pub use source::PathSource;
pub use traits::PathAlgorithm;
