//! Foundation types for silo.
//!
//! This crate provides the core value types shared by every other silo
//! crate. Nothing here performs hashing or I/O — these are the vocabulary
//! types the rest of the system speaks in.
//!
//! # Key Types
//!
//! - [`DigestAlgorithm`] — Named hash algorithm with a fixed output length
//! - [`DigestValue`] — Immutable digest bytes tagged with their algorithm
//! - [`PathKey`] — Stable lower-case hex token that re-derives a storage path
//! - [`DirectoryLayout`] — Fan-out configuration (width, depth, suffix)

pub mod algorithm;
pub mod digest;
pub mod error;
pub mod key;
pub mod layout;

pub use algorithm::DigestAlgorithm;
pub use digest::DigestValue;
pub use error::TypeError;
pub use key::PathKey;
pub use layout::DirectoryLayout;
