//! Staged writes and the in-memory pool store.
//!
//! Every mutating pool call first builds a [`WriteSet`] against a read view
//! of the store. Nothing is written until the whole call has validated and
//! the store has prepared it; the token ledger is called last, from inside
//! [`PoolStore::apply_with`], and the set then lands in one step. The [`MemoryPoolStore`] is suitable for testing; the
//! production node uses RocksDB (ash-node).

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::error::{LedgerError, PoolError, StoreError};
use crate::multiplier::MultiplierRecord;
use crate::traits::PoolStore;
use crate::types::{Address, Ash, Hash256};

/// Writes staged by one pool call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteSet {
    multipliers: BTreeMap<Address, MultiplierRecord>,
    consumed_leaves: BTreeSet<Hash256>,
    /// `(cycle, account) -> ash delta`.
    ash: BTreeMap<(u64, Address), Ash>,
}

impl WriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage the full record for `account`, replacing any earlier staged one.
    pub fn set_multiplier(&mut self, account: Address, record: MultiplierRecord) {
        self.multipliers.insert(account, record);
    }

    /// Staged record for `account`, if any.
    pub fn multiplier(&self, account: &Address) -> Option<MultiplierRecord> {
        self.multipliers.get(account).copied()
    }

    /// Stage `leaf` as consumed. Returns `false` if it was already staged.
    pub fn consume_leaf(&mut self, leaf: Hash256) -> bool {
        self.consumed_leaves.insert(leaf)
    }

    pub fn is_leaf_staged(&self, leaf: &Hash256) -> bool {
        self.consumed_leaves.contains(leaf)
    }

    /// Stage `amount` of ash for `account` in `cycle`.
    pub fn add_ash(&mut self, cycle: u64, account: Address, amount: Ash) -> Result<(), StoreError> {
        let slot = self.ash.entry((cycle, account)).or_insert(0);
        *slot = slot.checked_add(amount).ok_or(StoreError::Overflow)?;
        Ok(())
    }

    pub fn multipliers(&self) -> impl Iterator<Item = (&Address, &MultiplierRecord)> {
        self.multipliers.iter()
    }

    pub fn consumed_leaves(&self) -> impl Iterator<Item = &Hash256> {
        self.consumed_leaves.iter()
    }

    /// Staged per-account deltas as `((cycle, account), amount)`.
    pub fn ash_deltas(&self) -> impl Iterator<Item = (&(u64, Address), &Ash)> {
        self.ash.iter()
    }

    /// Staged deltas summed per cycle.
    pub fn cycle_deltas(&self) -> Result<BTreeMap<u64, Ash>, StoreError> {
        let mut totals = BTreeMap::new();
        for (&(cycle, _), &amount) in &self.ash {
            let slot: &mut Ash = totals.entry(cycle).or_insert(0);
            *slot = slot.checked_add(amount).ok_or(StoreError::Overflow)?;
        }
        Ok(totals)
    }

    pub fn is_empty(&self) -> bool {
        self.multipliers.is_empty() && self.consumed_leaves.is_empty() && self.ash.is_empty()
    }
}

/// In-memory pool store for testing.
///
/// Stores everything in `HashMap`s with no persistence.
#[derive(Debug, Default)]
pub struct MemoryPoolStore {
    multipliers: HashMap<Address, MultiplierRecord>,
    consumed_leaves: HashSet<Hash256>,
    user_ash: HashMap<(u64, Address), Ash>,
    total_ash: HashMap<u64, Ash>,
}

impl MemoryPoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of consumed leaves.
    pub fn leaf_count(&self) -> usize {
        self.consumed_leaves.len()
    }
}

impl PoolStore for MemoryPoolStore {
    fn multiplier(&self, account: &Address) -> Result<MultiplierRecord, StoreError> {
        Ok(self.multipliers.get(account).copied().unwrap_or_default())
    }

    fn is_leaf_consumed(&self, leaf: &Hash256) -> Result<bool, StoreError> {
        Ok(self.consumed_leaves.contains(leaf))
    }

    fn user_ash(&self, cycle: u64, account: &Address) -> Result<Ash, StoreError> {
        Ok(self.user_ash.get(&(cycle, *account)).copied().unwrap_or(0))
    }

    fn total_ash(&self, cycle: u64) -> Result<Ash, StoreError> {
        Ok(self.total_ash.get(&cycle).copied().unwrap_or(0))
    }

    fn apply_with(
        &mut self,
        writes: &WriteSet,
        before_write: &mut dyn FnMut() -> Result<(), LedgerError>,
    ) -> Result<(), PoolError> {
        // Validate everything before the first mutation.
        if let Some(leaf) = writes
            .consumed_leaves()
            .find(|leaf| self.consumed_leaves.contains(*leaf))
        {
            return Err(StoreError::DuplicateLeaf(*leaf).into());
        }

        let mut user_updates = Vec::new();
        for (&key, &delta) in writes.ash_deltas() {
            let current = self.user_ash.get(&key).copied().unwrap_or(0);
            user_updates.push((key, current.checked_add(delta).ok_or(StoreError::Overflow)?));
        }

        let mut total_updates = Vec::new();
        for (cycle, delta) in writes.cycle_deltas()? {
            let current = self.total_ash.get(&cycle).copied().unwrap_or(0);
            total_updates.push((cycle, current.checked_add(delta).ok_or(StoreError::Overflow)?));
        }

        before_write()?;

        for (account, record) in writes.multipliers() {
            self.multipliers.insert(*account, *record);
        }
        self.consumed_leaves.extend(writes.consumed_leaves().copied());
        self.user_ash.extend(user_updates);
        self.total_ash.extend(total_updates);
        Ok(())
    }
}
