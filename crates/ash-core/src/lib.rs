//! # ash-core
//! Foundation types and traits for the ash burn pool.
//!
//! Everything in this crate is pure: no storage engine, no clock, no I/O.
//! The engine in `ash-pool` composes these pieces with injected collaborators.

pub mod constants;
pub mod cycle;
pub mod error;
pub mod events;
pub mod merkle;
pub mod multiplier;
pub mod pool_state;
pub mod traits;
pub mod types;
pub mod weights;
