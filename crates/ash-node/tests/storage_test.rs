//! Pool state survives reopening the RocksDB store.

use std::sync::Arc;

use ash_core::error::{LedgerError, PoolError, ReplayError};
use ash_core::merkle::AllowlistTree;
use ash_core::traits::{PoolStore, TokenLedger};
use ash_core::types::{Address, ItemId};
use ash_node::RocksStore;
use ash_pool::{BatchNotification, BurnPool, CombinedUnlockPolicy, ItemNotification, PoolConfig, UnlockItem};

const T0: u64 = 1_700_000_000;

struct NullLedger;

impl TokenLedger for NullLedger {
    fn burn_batch(&self, _: &Address, _: &[ItemId], _: &[u64]) -> Result<(), LedgerError> {
        Ok(())
    }
}

fn alice() -> Address {
    Address([0xA1; 20])
}

fn config(tree: &AllowlistTree) -> PoolConfig {
    PoolConfig {
        initial_time: T0,
        cycle_duration: 3_600,
        max_cycle: 10,
        source_ledger: Address([0xEE; 20]),
        unlock_item: UnlockItem { contract: Address([0xDD; 20]), item_id: 50 },
        merkle_root: tree.root(),
        token_multiplier: 2,
        item_ids: vec![1, 2, 3, 4, 5, 6, 7],
        item_weights: vec![1, 3, 3, 5, 9, 25, 16],
        weight_overwrite: Default::default(),
        combined_unlock: CombinedUnlockPolicy::Strict,
        denominator: 10_000,
    }
}

fn open_pool(path: &std::path::Path, tree: &AllowlistTree) -> BurnPool {
    let store = RocksStore::open(path).unwrap();
    BurnPool::with_clock(config(tree), Box::new(store), Arc::new(NullLedger), || T0).unwrap()
}

#[test]
fn pool_state_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pooldata");
    let tree = AllowlistTree::from_entries(&[(alice(), 20_000), (Address([0xB0; 20]), 15_000)]);

    {
        let pool = open_pool(&path, &tree);
        pool.unlock(&tree.proof_for(&alice(), 20_000).unwrap(), &alice(), 20_000)
            .unwrap();
        pool.on_item_received(&ItemNotification {
            source: Address([0xDD; 20]),
            operator: alice(),
            from: alice(),
            item_id: 50,
            value: 1,
            data: vec![],
        })
        .unwrap();
        pool.on_batch_received(&BatchNotification {
            source: Address([0xEE; 20]),
            operator: alice(),
            from: alice(),
            item_ids: vec![1, 2, 3, 4, 5, 6, 7],
            values: vec![1, 2, 3, 4, 3, 2, 1],
            data: vec![],
        })
        .unwrap();
    }

    let pool = open_pool(&path, &tree);
    assert_eq!(pool.user_ash_per_cycle(0, &alice()).unwrap(), 516);
    assert_eq!(pool.total_ash_per_cycle(0).unwrap(), 516);

    let info = pool.multiplier_info(&alice()).unwrap();
    assert_eq!((info.numerator, info.scalar), (20_000, 2));

    let leaf = pool.unlock_leaf(&alice(), 20_000);
    assert!(pool.is_leaf_consumed(&leaf).unwrap());
    assert_eq!(
        pool.unlock(&tree.proof_for(&alice(), 20_000).unwrap(), &alice(), 20_000),
        Err(PoolError::Replay(ReplayError::LeafConsumed(leaf)))
    );
}

#[test]
fn store_reopens_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh");
    {
        RocksStore::open(&path).unwrap();
    }
    let store = RocksStore::open(&path).unwrap();
    assert_eq!(store.total_ash(0).unwrap(), 0);
    assert_eq!(store.leaf_count().unwrap(), 0);
}
