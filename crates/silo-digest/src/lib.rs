//! Streaming digest computation for silo.
//!
//! This crate turns a named hash algorithm into something a storage pipeline
//! can thread a byte stream through exactly once:
//!
//! - [`StreamHasher`] — reset-and-reusable hash instance behind one trait
//!   (BLAKE3 and SHA-2 implementations)
//! - [`HasherFactory`] — fail-fast construction from an algorithm name
//! - [`DigestReader`] / [`DigestWriter`] — wrap a stream, hash every byte
//!   that passes through, finalize exactly once at end-of-stream or close
//! - [`DigestNotifier`] — one-shot, ordered listener dispatch for the
//!   finalized digest
//! - [`DigestPool`] — bounded, growable pool of hasher instances for hot
//!   paths that hash many small inputs
//!
//! A single stream instance is single-reader/single-writer: no internal
//! locking is provided for stream state. The pool is the one component
//! designed for concurrent use from many threads.

pub mod error;
pub mod hasher;
pub mod notifier;
pub mod pool;
pub mod stream;

pub use error::{DigestError, DigestResult};
pub use hasher::{HasherFactory, StreamHasher};
pub use notifier::{DigestListener, DigestNotifier};
pub use pool::{DigestPool, ExhaustionPolicy, PoolConfig, PooledHasher};
pub use stream::{DigestReader, DigestWriter};
