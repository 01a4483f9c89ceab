//! # ash-pool — Burn-to-earn ash accounting engine.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! - **Aggregation**: burned quantities are weighted per item type, boosted by
//!   the account's token multiplier scalar and then its game multiplier
//!   numerator, and accumulated per account and per cycle.
//! - **Merkle unlock**: a one-time, proof-gated grant of the game multiplier
//!   numerator, replay-guarded by consuming the `(account, numerator)` leaf.
//! - **Token unlock**: receiving one unit of the designated unlock item sets
//!   the token multiplier scalar, optionally together with a Merkle unlock.
//! - **Atomicity**: every call stages its writes and commits them in one step
//!   after validation and ledger destruction succeed.

pub mod aggregator;
pub mod config;
pub mod engine;
pub mod notification;
pub mod payload;

pub use config::{CombinedUnlockPolicy, PoolConfig, UnlockItem};
pub use engine::{BurnPool, BurnReceipt, LogSink};
pub use notification::{BatchNotification, ItemNotification};
pub use payload::UnlockPayload;
