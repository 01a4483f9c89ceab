//! Item weight table.
//!
//! Maps item-type ids to the positive integer weight converting a burned
//! quantity into raw ash. Unconfigured ids have weight 0, which the
//! aggregator rejects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::ItemId;

/// How [`WeightTable::from_pairs`] treats an id that repeats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightOverwrite {
    /// Fail with `AlreadySetTokenWeight`.
    #[default]
    Reject,
    /// Keep the most recent weight.
    Replace,
}

/// Immutable-after-construction `item id -> weight` mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WeightTable {
    weights: BTreeMap<ItemId, u64>,
    policy: WeightOverwrite,
}

impl WeightTable {
    /// An empty table with the given overwrite policy.
    pub fn new(policy: WeightOverwrite) -> Self {
        Self {
            weights: BTreeMap::new(),
            policy,
        }
    }

    /// Build a table from two equal-length sequences. The table cannot be
    /// changed afterwards:
    ///
    /// ```compile_fail
    /// use ash_core::weights::{WeightOverwrite, WeightTable};
    ///
    /// let mut table = WeightTable::from_pairs(&[1], &[5], WeightOverwrite::Replace).unwrap();
    /// table.configure(&[1], &[50]).unwrap();
    /// ```
    pub fn from_pairs(
        ids: &[ItemId],
        weights: &[u64],
        policy: WeightOverwrite,
    ) -> Result<Self, ConfigError> {
        let mut table = Self::new(policy);
        table.configure(ids, weights)?;
        Ok(table)
    }

    /// Add `(id, weight)` pairs.
    ///
    /// The whole batch is validated before anything is stored, so a failed
    /// call leaves the table unchanged.
    fn configure(&mut self, ids: &[ItemId], weights: &[u64]) -> Result<(), ConfigError> {
        if ids.len() != weights.len() {
            return Err(ConfigError::InconsistentArrays {
                ids: ids.len(),
                weights: weights.len(),
            });
        }

        let mut staged = BTreeMap::new();
        for (&id, &weight) in ids.iter().zip(weights) {
            if weight == 0 {
                return Err(ConfigError::ZeroWeight(id));
            }
            let seen = self.weights.contains_key(&id) || staged.contains_key(&id);
            if seen && self.policy == WeightOverwrite::Reject {
                return Err(ConfigError::AlreadySetTokenWeight(id));
            }
            staged.insert(id, weight);
        }

        self.weights.extend(staged);
        Ok(())
    }

    /// Weight of `id`, or 0 if unconfigured.
    pub fn weight_of(&self, id: ItemId) -> u64 {
        self.weights.get(&id).copied().unwrap_or(0)
    }

    pub fn policy(&self) -> WeightOverwrite {
        self.policy
    }

    /// Number of configured ids.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Configured `(id, weight)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, u64)> + '_ {
        self.weights.iter().map(|(&id, &w)| (id, w))
    }
}
