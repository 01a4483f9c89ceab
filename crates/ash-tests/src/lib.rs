//! End-to-end and adversarial test suite for the ash pool.
//!
//! Integration tests drive the pool through its notification entry points
//! against both the in-memory and RocksDB stores, and try to break its
//! accounting and replay invariants under randomized inputs.

pub mod helpers;
