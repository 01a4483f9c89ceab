//! RocksDB-backed persistent pool state.
//!
//! Implements [`PoolStore`] using RocksDB column families for multiplier
//! words, consumed leaves, and per-cycle ash counters. Every
//! [`apply_with`](PoolStore::apply_with) builds one [`WriteBatch`] from its
//! reads, runs the caller's hook, then lands the batch atomically.
//!
//! Key layout (all integers big-endian so keys sort by cycle):
//! - `multipliers`: `account(20)` -> packed multiplier word (32)
//! - `consumed_leaves`: `leaf(32)` -> empty
//! - `user_ash`: `cycle(8) || account(20)` -> `u128` (16)
//! - `total_ash`: `cycle(8)` -> `u128` (16)

use std::path::Path;

use rocksdb::{ColumnFamilyDescriptor, DB, Options, WriteBatch};

use ash_core::error::{LedgerError, PoolError, StoreError};
use ash_core::multiplier::{MultiplierRecord, MultiplierWord};
use ash_core::pool_state::WriteSet;
use ash_core::traits::PoolStore;
use ash_core::types::{Address, Ash, Hash256};

// --- Column family names ---

const CF_MULTIPLIERS: &str = "multipliers";
const CF_CONSUMED_LEAVES: &str = "consumed_leaves";
const CF_USER_ASH: &str = "user_ash";
const CF_TOTAL_ASH: &str = "total_ash";

/// All column family names.
const ALL_CFS: &[&str] = &[CF_MULTIPLIERS, CF_CONSUMED_LEAVES, CF_USER_ASH, CF_TOTAL_ASH];

fn backend(e: rocksdb::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// RocksDB-backed persistent pool state.
pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    /// Open or create a RocksDB database at the given path.
    ///
    /// Creates all column families if they don't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path.as_ref(), cf_descriptors).map_err(backend)?;
        Ok(Self { db })
    }

    /// Flush all in-memory buffers to disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush().map_err(backend)
    }

    /// Trigger manual compaction across all column families.
    pub fn compact(&self) -> Result<(), StoreError> {
        for cf_name in ALL_CFS {
            let cf = self.cf_handle(cf_name)?;
            self.db.compact_range_cf(cf, None::<&[u8]>, None::<&[u8]>);
        }
        Ok(())
    }

    /// Number of consumed leaves. Walks the whole column family.
    pub fn leaf_count(&self) -> Result<usize, StoreError> {
        let cf = self.cf_handle(CF_CONSUMED_LEAVES)?;
        let mut count = 0;
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            item.map_err(backend)?;
            count += 1;
        }
        Ok(count)
    }

    /// Get a column family handle.
    fn cf_handle(&self, name: &str) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("missing column family: {name}")))
    }

    fn get_ash(&self, cf_name: &str, key: &[u8]) -> Result<Ash, StoreError> {
        let cf = self.cf_handle(cf_name)?;
        match self.db.get_cf(cf, key).map_err(backend)? {
            Some(bytes) => {
                let arr: [u8; 16] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| StoreError::Corrupt(format!("{cf_name}: invalid counter length {}", bytes.len())))?;
                Ok(u128::from_be_bytes(arr))
            }
            None => Ok(0),
        }
    }

    /// Encode a per-account counter key: cycle(BE) || account.
    fn user_key(cycle: u64, account: &Address) -> [u8; 28] {
        let mut key = [0u8; 28];
        key[0..8].copy_from_slice(&cycle.to_be_bytes());
        key[8..28].copy_from_slice(account.as_bytes());
        key
    }

    /// Encode a cycle as big-endian bytes for ordered iteration.
    fn cycle_key(cycle: u64) -> [u8; 8] {
        cycle.to_be_bytes()
    }
}

impl PoolStore for RocksStore {
    fn multiplier(&self, account: &Address) -> Result<MultiplierRecord, StoreError> {
        let cf = self.cf_handle(CF_MULTIPLIERS)?;
        match self.db.get_cf(cf, account.as_bytes()).map_err(backend)? {
            Some(bytes) => {
                let arr: [u8; 32] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| StoreError::Corrupt(format!("multiplier word length {}", bytes.len())))?;
                Ok(MultiplierWord(arr).unpack())
            }
            None => Ok(MultiplierRecord::default()),
        }
    }

    fn is_leaf_consumed(&self, leaf: &Hash256) -> Result<bool, StoreError> {
        let cf = self.cf_handle(CF_CONSUMED_LEAVES)?;
        Ok(self.db.get_pinned_cf(cf, leaf.as_bytes()).map_err(backend)?.is_some())
    }

    fn user_ash(&self, cycle: u64, account: &Address) -> Result<Ash, StoreError> {
        self.get_ash(CF_USER_ASH, &Self::user_key(cycle, account))
    }

    fn total_ash(&self, cycle: u64) -> Result<Ash, StoreError> {
        self.get_ash(CF_TOTAL_ASH, &Self::cycle_key(cycle))
    }

    fn apply_with(
        &mut self,
        writes: &WriteSet,
        before_write: &mut dyn FnMut() -> Result<(), LedgerError>,
    ) -> Result<(), PoolError> {
        // Validate everything before building the batch.
        for leaf in writes.consumed_leaves() {
            if self.is_leaf_consumed(leaf)? {
                return Err(StoreError::DuplicateLeaf(*leaf).into());
            }
        }

        let mut batch = WriteBatch::default();

        let cf_multipliers = self.cf_handle(CF_MULTIPLIERS)?;
        let cf_leaves = self.cf_handle(CF_CONSUMED_LEAVES)?;
        let cf_user = self.cf_handle(CF_USER_ASH)?;
        let cf_total = self.cf_handle(CF_TOTAL_ASH)?;

        for (&(cycle, account), &delta) in writes.ash_deltas() {
            let current = self.user_ash(cycle, &account)?;
            let updated = current.checked_add(delta).ok_or(StoreError::Overflow)?;
            batch.put_cf(cf_user, Self::user_key(cycle, &account), updated.to_be_bytes());
        }
        for (cycle, delta) in writes.cycle_deltas()? {
            let current = self.total_ash(cycle)?;
            let updated = current.checked_add(delta).ok_or(StoreError::Overflow)?;
            batch.put_cf(cf_total, Self::cycle_key(cycle), updated.to_be_bytes());
        }
        for (account, record) in writes.multipliers() {
            batch.put_cf(cf_multipliers, account.as_bytes(), record.pack().as_bytes());
        }
        for leaf in writes.consumed_leaves() {
            batch.put_cf(cf_leaves, leaf.as_bytes(), b"");
        }

        before_write()?;
        if batch.is_empty() {
            return Ok(());
        }
        self.db.write(batch).map_err(backend)?;
        Ok(())
    }
}
