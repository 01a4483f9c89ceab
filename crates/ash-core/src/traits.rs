//! Trait interfaces for the ash burn pool.
//!
//! These traits are the seams between the engine and its collaborators:
//! - [`PoolStore`] — durable pool state (ash-core memory store, ash-node RocksDB)
//! - [`TokenLedger`] — the external ledger that destroys burned items
//! - [`ProofVerifier`] — leaf hashing and Merkle proof verification
//! - [`EventSink`] — receives events of committed calls

use crate::error::{LedgerError, PoolError, StoreError};
use crate::events::PoolEvent;
use crate::multiplier::MultiplierRecord;
use crate::pool_state::WriteSet;
use crate::types::{Address, Ash, Hash256, ItemId};

/// Durable pool state: multiplier records, consumed leaves, cycle counters.
///
/// Reads of absent keys return the zero value (unset record, unconsumed
/// leaf, zero ash). Writes only happen through [`apply_with`](Self::apply_with).
pub trait PoolStore: Send + Sync {
    /// Multiplier record of `account`. All-unset if never written.
    fn multiplier(&self, account: &Address) -> Result<MultiplierRecord, StoreError>;

    /// Whether `leaf` has been consumed by a Merkle unlock.
    fn is_leaf_consumed(&self, leaf: &Hash256) -> Result<bool, StoreError>;

    /// Ash accumulated by `account` in `cycle`.
    fn user_ash(&self, cycle: u64, account: &Address) -> Result<Ash, StoreError>;

    /// Ash accumulated by all accounts in `cycle`.
    fn total_ash(&self, cycle: u64) -> Result<Ash, StoreError>;

    /// Apply a staged write set atomically: either every write lands or none.
    ///
    /// Implementations perform every read and check the set needs, then call
    /// `before_write` exactly once, and write only if it returns `Ok`. Nothing
    /// fallible but the final backend write may follow the hook.
    ///
    /// # Errors
    ///
    /// - [`StoreError::DuplicateLeaf`] if a staged leaf is already consumed
    /// - [`StoreError::Overflow`] if a counter addition overflows
    /// - any error of `before_write`, with the store unchanged
    fn apply_with(
        &mut self,
        writes: &WriteSet,
        before_write: &mut dyn FnMut() -> Result<(), LedgerError>,
    ) -> Result<(), PoolError>;

    /// [`apply_with`](Self::apply_with) with nothing to run before the write.
    fn apply(&mut self, writes: &WriteSet) -> Result<(), PoolError> {
        self.apply_with(writes, &mut || Ok(()))
    }
}

/// The external token ledger holding the burnable items.
pub trait TokenLedger: Send + Sync {
    /// Destroy `values[i]` units of `item_ids[i]` held on behalf of `holder`.
    ///
    /// Called once per accepted burn, from inside [`PoolStore::apply_with`]
    /// once the store has prepared its write. An error aborts the burn with
    /// no state change.
    fn burn_batch(
        &self,
        holder: &Address,
        item_ids: &[ItemId],
        values: &[u64],
    ) -> Result<(), LedgerError>;
}

/// Leaf hashing and inclusion-proof verification for Merkle unlocks.
pub trait ProofVerifier: Send + Sync {
    /// Replay-guard leaf for `(account, numerator)`.
    fn unlock_leaf(&self, account: &Address, numerator: u128) -> Hash256;

    /// Whether `proof` links `leaf` to `root`.
    fn verify(&self, proof: &[Hash256], root: &Hash256, leaf: &Hash256) -> bool;
}

/// Receives the events of committed calls.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &PoolEvent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::{self, AllowlistTree};
    use parking_lot::Mutex;

    // ------------------------------------------------------------------
    // Mock: TokenLedger
    // ------------------------------------------------------------------

    struct MockLedger {
        burns: Mutex<Vec<(Address, Vec<ItemId>, Vec<u64>)>>,
        fail: bool,
    }

    impl TokenLedger for MockLedger {
        fn burn_batch(
            &self,
            holder: &Address,
            item_ids: &[ItemId],
            values: &[u64],
        ) -> Result<(), LedgerError> {
            if self.fail {
                return Err(LedgerError::Rejected("paused".into()));
            }
            self.burns
                .lock()
                .push((*holder, item_ids.to_vec(), values.to_vec()));
            Ok(())
        }
    }

    // ------------------------------------------------------------------
    // Mock: ProofVerifier that accepts everything
    // ------------------------------------------------------------------

    struct AcceptAll;

    impl ProofVerifier for AcceptAll {
        fn unlock_leaf(&self, account: &Address, numerator: u128) -> Hash256 {
            merkle::unlock_leaf(account, numerator)
        }

        fn verify(&self, _proof: &[Hash256], _root: &Hash256, _leaf: &Hash256) -> bool {
            true
        }
    }

    #[test]
    fn ledger_records_burns() {
        let ledger = MockLedger { burns: Mutex::new(Vec::new()), fail: false };
        ledger.burn_batch(&Address([1; 20]), &[1, 2], &[3, 4]).unwrap();
        assert_eq!(ledger.burns.lock().len(), 1);
    }

    #[test]
    fn ledger_failure_surfaces() {
        let ledger = MockLedger { burns: Mutex::new(Vec::new()), fail: true };
        assert!(ledger.burn_batch(&Address([1; 20]), &[1], &[1]).is_err());
        assert!(ledger.burns.lock().is_empty());
    }

    #[test]
    fn verifiers_are_object_safe() {
        let tree = AllowlistTree::from_entries(&[(Address([1; 20]), 5), (Address([2; 20]), 6)]);
        let verifiers: Vec<Box<dyn ProofVerifier>> =
            vec![Box::new(merkle::Blake3Verifier), Box::new(AcceptAll)];
        for v in &verifiers {
            let leaf = v.unlock_leaf(&Address([1; 20]), 5);
            assert!(v.verify(&tree.proof(0).unwrap(), &tree.root(), &leaf));
        }
        assert!(!verifiers[0].verify(&[], &tree.root(), &Hash256::ZERO));
        assert!(verifiers[1].verify(&[], &tree.root(), &Hash256::ZERO));
    }
}
