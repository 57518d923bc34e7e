//! Test support for the reef backend.
//!
//! [`MemStore`] is a deterministic in-memory [`GameStore`] so daemon scenario
//! tests can drive the full HTTP surface without a database. No randomness,
//! no network I/O. [`FailStore`] fails every operation, for error-path tests.

mod mem_store;

pub use mem_store::{FailStore, MemStore};
