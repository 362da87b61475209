//! Bounded-admission concurrency control for silo ingestion.
//!
//! A [`WorkerGate`] bounds how many units of work *execute* at once by
//! blocking submitters instead of queueing or rejecting them. Each admitted
//! task runs on its own on-demand worker thread and releases its permit on
//! every exit path, panic included.
//!
//! # Quick Start
//!
//! ```rust
//! use silo_gate::{GateConfig, WorkerGate};
//!
//! let gate = WorkerGate::new(GateConfig::with_concurrency(2)).unwrap();
//! let handle = gate.submit(|| 2 + 2).unwrap();
//! assert_eq!(handle.join().unwrap(), 4);
//! ```

pub mod config;
pub mod error;
pub mod gate;

pub use config::GateConfig;
pub use error::{GateError, GateResult};
pub use gate::{TaskHandle, WorkerGate};
