//! Shared test helpers for E2E and adversarial tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use ash_core::error::LedgerError;
use ash_core::events::MemoryEventLog;
use ash_core::merkle::{self, AllowlistTree};
use ash_core::pool_state::MemoryPoolStore;
use ash_core::traits::{PoolStore, ProofVerifier, TokenLedger};
use ash_core::types::{Address, Hash256, ItemId};
use ash_pool::{
    BatchNotification, BurnPool, CombinedUnlockPolicy, ItemNotification, PoolConfig, UnlockItem,
    UnlockPayload,
};

/// Start of cycle 0 in every fixture.
pub const T0: u64 = 1_700_000_000;
/// One week.
pub const CYCLE: u64 = 604_800;
pub const MAX_CYCLE: u64 = 12;
/// Item id of the unlock item on [`unlock_contract`].
pub const UNLOCK_ID: ItemId = 1_000;
/// Scalar granted by the unlock item.
pub const SCALAR: u64 = 2;

pub const ITEM_IDS: [ItemId; 7] = [1, 2, 3, 4, 5, 6, 7];
pub const ITEM_WEIGHTS: [u64; 7] = [1, 3, 3, 5, 9, 25, 16];

/// Account address from a seed byte.
pub fn addr(seed: u8) -> Address {
    Address([seed; 20])
}

pub fn source_ledger() -> Address {
    addr(0xEE)
}

pub fn unlock_contract() -> Address {
    addr(0xDD)
}

/// Token ledger that records burns and can be switched to refuse them.
#[derive(Default)]
pub struct RecordingLedger {
    burns: Mutex<Vec<(Address, Vec<ItemId>, Vec<u64>)>>,
    refuse: AtomicBool,
}

impl RecordingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    pub fn burns(&self) -> Vec<(Address, Vec<ItemId>, Vec<u64>)> {
        self.burns.lock().clone()
    }
}

impl TokenLedger for RecordingLedger {
    fn burn_batch(&self, holder: &Address, item_ids: &[ItemId], values: &[u64]) -> Result<(), LedgerError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(LedgerError::Rejected("transfer paused".into()));
        }
        self.burns.lock().push((*holder, item_ids.to_vec(), values.to_vec()));
        Ok(())
    }
}

/// Verifier that accepts any proof. Leaves are still the real ones, so the
/// replay guard is exercised on its own.
pub struct AcceptAllVerifier;

impl ProofVerifier for AcceptAllVerifier {
    fn unlock_leaf(&self, account: &Address, numerator: u128) -> Hash256 {
        merkle::unlock_leaf(account, numerator)
    }

    fn verify(&self, _proof: &[Hash256], _root: &Hash256, _leaf: &Hash256) -> bool {
        true
    }
}

/// Pool configuration with the standard seven-item weight table.
pub fn pool_config(root: Hash256, policy: CombinedUnlockPolicy) -> PoolConfig {
    PoolConfig {
        initial_time: T0,
        cycle_duration: CYCLE,
        max_cycle: MAX_CYCLE,
        source_ledger: source_ledger(),
        unlock_item: UnlockItem { contract: unlock_contract(), item_id: UNLOCK_ID },
        merkle_root: root,
        token_multiplier: SCALAR,
        item_ids: ITEM_IDS.to_vec(),
        item_weights: ITEM_WEIGHTS.to_vec(),
        weight_overwrite: Default::default(),
        combined_unlock: policy,
        denominator: ash_core::constants::DENOMINATOR,
    }
}

/// A pool with a controllable clock, recording ledger, and event log.
pub struct Harness {
    pub pool: BurnPool,
    pub ledger: Arc<RecordingLedger>,
    pub events: Arc<MemoryEventLog>,
    pub tree: AllowlistTree,
    time: Arc<AtomicU64>,
}

impl Harness {
    /// In-memory pool over the given allowlist.
    pub fn new(entries: &[(Address, u128)], policy: CombinedUnlockPolicy) -> Self {
        Self::with_store(entries, policy, Box::new(MemoryPoolStore::new()))
    }

    pub fn with_store(entries: &[(Address, u128)], policy: CombinedUnlockPolicy, store: Box<dyn PoolStore>) -> Self {
        let tree = AllowlistTree::from_entries(entries);
        let ledger = Arc::new(RecordingLedger::new());
        let events = Arc::new(MemoryEventLog::new());
        let time = Arc::new(AtomicU64::new(T0));
        let clock = time.clone();
        let pool = BurnPool::with_clock(
            pool_config(tree.root(), policy),
            store,
            ledger.clone(),
            move || clock.load(Ordering::SeqCst),
        )
        .expect("fixture config is valid")
        .with_event_sink(events.clone());
        Self { pool, ledger, events, tree, time }
    }

    /// Swap the pool's proof verifier.
    pub fn with_verifier(self, verifier: Arc<dyn ProofVerifier>) -> Self {
        Self {
            pool: self.pool.with_verifier(verifier),
            ..self
        }
    }

    pub fn set_time(&self, now: u64) {
        self.time.store(now, Ordering::SeqCst);
    }

    /// Move the clock to `offset` seconds into `cycle`.
    pub fn enter_cycle(&self, cycle: u64, offset: u64) {
        self.set_time(T0 + cycle * CYCLE + offset);
    }

    /// Batch notification from the configured ledger.
    pub fn batch(&self, from: Address, item_ids: &[ItemId], values: &[u64]) -> BatchNotification {
        BatchNotification {
            source: source_ledger(),
            operator: from,
            from,
            item_ids: item_ids.to_vec(),
            values: values.to_vec(),
            data: Vec::new(),
        }
    }

    /// Unlock-item notification, optionally carrying a Merkle unlock payload.
    pub fn unlock_item(&self, from: Address, payload: Option<&UnlockPayload>) -> ItemNotification {
        ItemNotification {
            source: unlock_contract(),
            operator: from,
            from,
            item_id: UNLOCK_ID,
            value: 1,
            data: payload
                .map(|p| p.to_bytes().expect("payload encodes"))
                .unwrap_or_default(),
        }
    }

    /// Payload carrying the allowlist proof for `(account, numerator)`.
    pub fn payload(&self, account: &Address, numerator: u128) -> UnlockPayload {
        UnlockPayload {
            proof: self.tree.proof_for(account, numerator).expect("entry in allowlist"),
            numerator,
        }
    }

    /// Merkle unlock using the allowlist proof.
    pub fn unlock(&self, account: &Address, numerator: u128) -> Result<(), ash_core::error::PoolError> {
        let proof = self.tree.proof_for(account, numerator).unwrap_or_default();
        self.pool.unlock(&proof, account, numerator).map(|_| ())
    }
}
