//! Error types for the ash burn pool.
//!
//! Every failure aborts the whole call with no partial mutation. The enums
//! below follow the pool's error taxonomy: configuration (fatal at
//! construction), validation (bad inputs), replay (one-time state already
//! consumed), proof (Merkle verification), plus storage and ledger failures
//! reported by collaborators.
use thiserror::Error;

use crate::types::{Address, Hash256, ItemId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HexError {
    #[error("invalid hex")] InvalidHex,
    #[error("invalid length: expected {expected} bytes, got {got}")] InvalidLength { expected: usize, got: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("inconsistent arrays: {ids} ids, {weights} weights")] InconsistentArrays { ids: usize, weights: usize },
    #[error("token weight already set for item {0}")] AlreadySetTokenWeight(ItemId),
    #[error("zero weight configured for item {0}")] ZeroWeight(ItemId),
    #[error("cycle duration must be positive")] ZeroCycleDuration,
    #[error("max cycle must be positive")] ZeroMaxCycle,
    #[error("token multiplier must be positive")] ZeroScalar,
    #[error("denominator must be positive")] ZeroDenominator,
    #[error("initial time {initial_time} is after activation time {now}")] InitialTimeInFuture { initial_time: u64, now: u64 },
    #[error("invalid: {0}")] Invalid(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid token contract: {0}")] InvalidToken(Address),
    #[error("invalid token id: {0}")] InvalidTokenId(ItemId),
    #[error("invalid token amount {amount} for item {item_id}")] InvalidTokenAmount { item_id: ItemId, amount: u64 },
    #[error("invalid cycle: {cycle} > max {max_cycle}")] InvalidCycle { cycle: u64, max_cycle: u64 },
    #[error("timestamp {now} precedes initial time {initial_time}")] BeforeStart { now: u64, initial_time: u64 },
    #[error("inconsistent arrays: {ids} ids, {values} values")] InconsistentArrays { ids: usize, values: usize },
    #[error("malformed unlock payload: {0}")] MalformedPayload(String),
    #[error("zero multiplier numerator")] ZeroNumerator,
    #[error("ash overflow")] AshOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("leaf already consumed: {0}")] LeafConsumed(Hash256),
    #[error("numerator already set for {account}: {current}")] AlreadySet { account: Address, current: u128 },
    #[error("token multiplier already unlocked for {account}: {current}")] AlreadyUnlocked { account: Address, current: u128 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    #[error("invalid proof for {account} numerator {numerator} (leaf {leaf})")] InvalidProof { account: Address, numerator: u128, leaf: Hash256 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("counter overflow")] Overflow,
    #[error("leaf already stored: {0}")] DuplicateLeaf(Hash256),
    #[error("corrupt record: {0}")] Corrupt(String),
    #[error("backend: {0}")] Backend(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("burn rejected: {0}")] Rejected(String),
    #[error("ledger unavailable: {0}")] Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error(transparent)] Config(#[from] ConfigError),
    #[error(transparent)] Validation(#[from] ValidationError),
    #[error(transparent)] Replay(#[from] ReplayError),
    #[error(transparent)] Proof(#[from] ProofError),
    #[error(transparent)] Store(#[from] StoreError),
    #[error(transparent)] Ledger(#[from] LedgerError),
}
