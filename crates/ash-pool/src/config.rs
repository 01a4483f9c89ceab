//! Construction-time pool configuration.
//!
//! Every field is fixed for the lifetime of a pool. [`PoolConfig::validate`]
//! rejects bad arguments with a [`ConfigError`]; a pool is never activated
//! from an invalid configuration.

use std::num::NonZeroU128;

use serde::{Deserialize, Serialize};

use ash_core::constants::DENOMINATOR;
use ash_core::cycle::CycleClock;
use ash_core::error::ConfigError;
use ash_core::types::{Address, Hash256, ItemId};
use ash_core::weights::{WeightOverwrite, WeightTable};

/// The designated singleton unlock item: `(contract, item id)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockItem {
    pub contract: Address,
    pub item_id: ItemId,
}

/// What a combined unlock does when the account's numerator is already set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinedUnlockPolicy {
    /// Abort the whole receipt with `AlreadySet`.
    #[default]
    Strict,
    /// Ignore the payload and unlock only the scalar.
    SkipIfSet,
}

fn default_denominator() -> u64 {
    DENOMINATOR
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Start of cycle 0 (Unix seconds).
    pub initial_time: u64,
    /// Length of one cycle in seconds.
    pub cycle_duration: u64,
    /// Last cycle (inclusive) in which the pool accepts activity.
    pub max_cycle: u64,
    /// The only token ledger whose burn notifications are accepted.
    pub source_ledger: Address,
    pub unlock_item: UnlockItem,
    /// Root of the `(account, numerator)` allowlist.
    pub merkle_root: Hash256,
    /// Scalar granted by the unlock item.
    pub token_multiplier: u64,
    #[serde(default)]
    pub item_ids: Vec<ItemId>,
    #[serde(default)]
    pub item_weights: Vec<u64>,
    #[serde(default)]
    pub weight_overwrite: WeightOverwrite,
    #[serde(default)]
    pub combined_unlock: CombinedUnlockPolicy,
    /// Fixed-point base for the numerator.
    #[serde(default = "default_denominator")]
    pub denominator: u64,
}

impl PoolConfig {
    pub fn cycle_clock(&self) -> Result<CycleClock, ConfigError> {
        CycleClock::new(self.initial_time, self.cycle_duration, self.max_cycle)
    }

    pub fn weight_table(&self) -> Result<WeightTable, ConfigError> {
        WeightTable::from_pairs(&self.item_ids, &self.item_weights, self.weight_overwrite)
    }

    /// The token multiplier as a set-once value.
    pub fn scalar(&self) -> Result<NonZeroU128, ConfigError> {
        NonZeroU128::new(self.token_multiplier as u128).ok_or(ConfigError::ZeroScalar)
    }

    /// Check every construction argument against activation time `now`.
    pub fn validate(&self, now: u64) -> Result<(), ConfigError> {
        self.cycle_clock()?;
        self.weight_table()?;
        self.scalar()?;
        if self.denominator == 0 {
            return Err(ConfigError::ZeroDenominator);
        }
        if self.initial_time > now {
            return Err(ConfigError::InitialTimeInFuture {
                initial_time: self.initial_time,
                now,
            });
        }
        if self.source_ledger.is_zero() {
            return Err(ConfigError::Invalid("source ledger is the zero address".into()));
        }
        if self.unlock_item.contract.is_zero() {
            return Err(ConfigError::Invalid("unlock item contract is the zero address".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PoolConfig {
        PoolConfig {
            initial_time: 1_000,
            cycle_duration: 100,
            max_cycle: 10,
            source_ledger: Address([1; 20]),
            unlock_item: UnlockItem {
                contract: Address([2; 20]),
                item_id: 42,
            },
            merkle_root: Hash256([3; 32]),
            token_multiplier: 2,
            item_ids: vec![1, 2],
            item_weights: vec![1, 3],
            weight_overwrite: WeightOverwrite::Reject,
            combined_unlock: CombinedUnlockPolicy::Strict,
            denominator: DENOMINATOR,
        }
    }

    #[test]
    fn sample_is_valid() {
        assert_eq!(sample().validate(1_000), Ok(()));
    }

    #[test]
    fn initial_time_after_activation() {
        assert_eq!(
            sample().validate(999),
            Err(ConfigError::InitialTimeInFuture { initial_time: 1_000, now: 999 })
        );
    }

    #[test]
    fn zero_scalar() {
        let cfg = PoolConfig { token_multiplier: 0, ..sample() };
        assert_eq!(cfg.validate(2_000), Err(ConfigError::ZeroScalar));
    }

    #[test]
    fn zero_denominator() {
        let cfg = PoolConfig { denominator: 0, ..sample() };
        assert_eq!(cfg.validate(2_000), Err(ConfigError::ZeroDenominator));
    }

    #[test]
    fn bad_weights_propagate() {
        let cfg = PoolConfig { item_weights: vec![1], ..sample() };
        assert_eq!(
            cfg.validate(2_000),
            Err(ConfigError::InconsistentArrays { ids: 2, weights: 1 })
        );
    }

    #[test]
    fn bad_clock_propagates() {
        let cfg = PoolConfig { cycle_duration: 0, ..sample() };
        assert_eq!(cfg.validate(2_000), Err(ConfigError::ZeroCycleDuration));
    }

    #[test]
    fn zero_addresses_rejected() {
        let cfg = PoolConfig { source_ledger: Address::ZERO, ..sample() };
        assert!(matches!(cfg.validate(2_000), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn json_defaults() {
        let json = serde_json::json!({
            "initial_time": 1000,
            "cycle_duration": 100,
            "max_cycle": 10,
            "source_ledger": format!("0x{}", "01".repeat(20)),
            "unlock_item": { "contract": format!("0x{}", "02".repeat(20)), "item_id": 42 },
            "merkle_root": "03".repeat(32),
            "token_multiplier": 2,
        });
        let cfg: PoolConfig = serde_json::from_value(json).unwrap();
        assert_eq!(cfg.denominator, DENOMINATOR);
        assert_eq!(cfg.combined_unlock, CombinedUnlockPolicy::Strict);
        assert_eq!(cfg.weight_overwrite, WeightOverwrite::Reject);
        assert!(cfg.item_ids.is_empty());
        assert_eq!(cfg.validate(1_000), Ok(()));
    }
}
