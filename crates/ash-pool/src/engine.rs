//! The burn pool: Merkle unlocks, token unlocks and ash aggregation.
//!
//! Wires the cycle clock, weight table and multiplier records from ash-core
//! to an injected [`PoolStore`], [`TokenLedger`], [`ProofVerifier`] and
//! [`EventSink`].
//!
//! Every entry point holds the store lock for its whole duration, stages its
//! writes in a [`WriteSet`], and commits only after every check has passed.
//! For burns the ledger destruction is the last step before the store's
//! atomic write. A rejected call leaves the store untouched, burns nothing
//! and emits no events.

use std::fmt;
use std::num::NonZeroU128;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use ash_core::constants::{BATCH_ACCEPTED, SINGLE_ACCEPTED, UNLOCK_ITEM_AMOUNT};
use ash_core::cycle::CycleClock;
use ash_core::error::{LedgerError, PoolError, ProofError, ReplayError, ValidationError};
use ash_core::events::PoolEvent;
use ash_core::merkle::Blake3Verifier;
use ash_core::multiplier::{MultiplierInfo, MultiplierRecord, MultiplierWord, Slot};
use ash_core::pool_state::WriteSet;
use ash_core::traits::{EventSink, PoolStore, ProofVerifier, TokenLedger};
use ash_core::types::{Address, Ash, Hash256, ItemId};
use ash_core::weights::WeightTable;

use crate::aggregator;
use crate::config::{CombinedUnlockPolicy, PoolConfig};
use crate::notification::{BatchNotification, ItemNotification};
use crate::payload::UnlockPayload;

/// Outcome of a committed burn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BurnReceipt {
    pub account: Address,
    pub cycle: u64,
    /// Boosted ash credited by this burn.
    pub ash: Ash,
    /// The account's total for `cycle` after this burn.
    pub user_total: Ash,
    /// The global total for `cycle` after this burn.
    pub cycle_total: Ash,
    /// Multiplier word the boost was computed from.
    pub multiplier: MultiplierWord,
}

/// Default sink: forwards committed events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &PoolEvent) {
        debug!(?event, "pool: event");
    }
}

/// Writes and events of one call, committed together.
#[derive(Default)]
struct Staged {
    writes: WriteSet,
    events: Vec<PoolEvent>,
}

pub struct BurnPool {
    config: PoolConfig,
    clock: CycleClock,
    weights: WeightTable,
    scalar: NonZeroU128,
    denominator: u128,
    store: Mutex<Box<dyn PoolStore>>,
    ledger: Arc<dyn TokenLedger>,
    verifier: Arc<dyn ProofVerifier>,
    events: Arc<dyn EventSink>,
    now: Box<dyn Fn() -> u64 + Send + Sync>,
}

impl fmt::Debug for BurnPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BurnPool")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn system_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl BurnPool {
    /// Create a pool driven by the system clock.
    pub fn new(
        config: PoolConfig,
        store: Box<dyn PoolStore>,
        ledger: Arc<dyn TokenLedger>,
    ) -> Result<Self, PoolError> {
        Self::with_clock(config, store, ledger, system_now)
    }

    /// Create a pool with a custom clock (Unix seconds).
    ///
    /// The configuration is validated against the clock's current reading.
    pub fn with_clock(
        config: PoolConfig,
        store: Box<dyn PoolStore>,
        ledger: Arc<dyn TokenLedger>,
        clock: impl Fn() -> u64 + Send + Sync + 'static,
    ) -> Result<Self, PoolError> {
        config.validate(clock())?;
        let cycle_clock = config.cycle_clock()?;
        let weights = config.weight_table()?;
        let scalar = config.scalar()?;

        info!(
            initial_time = config.initial_time,
            cycle_duration = config.cycle_duration,
            max_cycle = config.max_cycle,
            weights = weights.len(),
            root = %config.merkle_root,
            "pool: activated"
        );

        Ok(Self {
            clock: cycle_clock,
            weights,
            scalar,
            denominator: config.denominator as u128,
            config,
            store: Mutex::new(store),
            ledger,
            verifier: Arc::new(Blake3Verifier),
            events: Arc::new(LogSink),
            now: Box::new(clock),
        })
    }

    /// Replace the proof verifier.
    pub fn with_verifier(mut self, verifier: Arc<dyn ProofVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Replace the event sink.
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    /// Handle a batch burn notification from the source ledger.
    ///
    /// Returns [`BATCH_ACCEPTED`] once the burn is recorded. Any error must
    /// abort the ledger's transfer.
    pub fn on_batch_received(&self, notification: &BatchNotification) -> Result<[u8; 4], PoolError> {
        if notification.source != self.config.source_ledger {
            warn!(source = %notification.source, "pool: batch from unknown ledger");
            return Err(ValidationError::InvalidToken(notification.source).into());
        }
        debug!(
            operator = %notification.operator,
            from = %notification.from,
            items = notification.item_ids.len(),
            "pool: batch received"
        );
        self.record_burn(
            &notification.from,
            &notification.item_ids,
            &notification.values,
            (self.now)(),
        )?;
        Ok(BATCH_ACCEPTED)
    }

    /// Handle receipt of a single item, which must be the unlock item.
    ///
    /// Unlocks the sender's token multiplier. If `data` carries an
    /// [`UnlockPayload`], the Merkle unlock is attempted first in the same
    /// call; see [`CombinedUnlockPolicy`] for an already-set numerator.
    pub fn on_item_received(&self, notification: &ItemNotification) -> Result<[u8; 4], PoolError> {
        let item = &self.config.unlock_item;
        if notification.source != item.contract {
            warn!(source = %notification.source, "pool: item from unknown contract");
            return Err(ValidationError::InvalidToken(notification.source).into());
        }
        if notification.item_id != item.item_id {
            return Err(ValidationError::InvalidTokenId(notification.item_id).into());
        }
        if notification.value != UNLOCK_ITEM_AMOUNT {
            return Err(ValidationError::InvalidTokenAmount {
                item_id: notification.item_id,
                amount: notification.value,
            }
            .into());
        }
        self.clock.active_cycle((self.now)())?;
        let payload = UnlockPayload::from_bytes(&notification.data)?;

        let account = &notification.from;
        let mut store = self.store.lock();
        let mut staged = Staged::default();

        if let Some(payload) = payload {
            let current = Self::staged_record(&**store, &staged, account)?;
            match (self.config.combined_unlock, current.numerator) {
                (CombinedUnlockPolicy::SkipIfSet, Slot::Set(_)) => {
                    debug!(%account, "pool: numerator already set, skipping payload");
                }
                _ => self.stage_merkle_unlock(
                    &**store,
                    &mut staged,
                    account,
                    payload.numerator,
                    &payload.proof,
                )?,
            }
        }

        let old = Self::staged_record(&**store, &staged, account)?;
        let new = old.with_scalar(account, self.scalar).inspect_err(|_| {
            warn!(%account, "pool: token multiplier already unlocked");
        })?;
        staged.writes.set_multiplier(*account, new);
        staged.events.push(PoolEvent::MultiplierUpdated {
            account: *account,
            old: old.pack(),
            new: new.pack(),
        });

        self.commit(&mut **store, staged)?;
        info!(%account, scalar = self.scalar.get(), "pool: token multiplier unlocked");
        Ok(SINGLE_ACCEPTED)
    }

    // ------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------

    /// Merkle unlock of `account`'s numerator. Callable by anyone: the proof,
    /// not the caller, authorizes the grant.
    ///
    /// # Errors
    ///
    /// - [`ReplayError::LeafConsumed`] if this `(account, numerator)` was used
    /// - [`ProofError::InvalidProof`] if the proof does not reach the root
    /// - [`ReplayError::AlreadySet`] if the numerator is already set
    pub fn unlock(
        &self,
        proof: &[Hash256],
        account: &Address,
        numerator: u128,
    ) -> Result<MultiplierInfo, PoolError> {
        let mut store = self.store.lock();
        let mut staged = Staged::default();
        self.stage_merkle_unlock(&**store, &mut staged, account, numerator, proof)?;
        let record = Self::staged_record(&**store, &staged, account)?;
        self.commit(&mut **store, staged)?;
        info!(%account, numerator, "pool: game multiplier unlocked");
        Ok(record.into())
    }

    /// Aggregate a burn of `values[i]` units of `item_ids[i]` by `account`
    /// at timestamp `now`, destroying the items through the token ledger.
    pub fn record_burn(
        &self,
        account: &Address,
        item_ids: &[ItemId],
        values: &[u64],
        now: u64,
    ) -> Result<BurnReceipt, PoolError> {
        let cycle = self.clock.active_cycle(now)?;
        let raw = aggregator::raw_ash(&self.weights, item_ids, values)?;

        let mut store = self.store.lock();
        let record = store.multiplier(account)?;
        let ash = aggregator::boost(raw, &record, self.denominator)?;
        let user_total = store
            .user_ash(cycle, account)?
            .checked_add(ash)
            .ok_or(ValidationError::AshOverflow)?;
        let cycle_total = store
            .total_ash(cycle)?
            .checked_add(ash)
            .ok_or(ValidationError::AshOverflow)?;

        let multiplier = record.pack();
        let mut staged = Staged::default();
        staged.writes.add_ash(cycle, *account, ash)?;
        staged.events.push(PoolEvent::AshRecorded {
            account: *account,
            cycle,
            item_ids: item_ids.to_vec(),
            values: values.to_vec(),
            ash,
            user_total,
            cycle_total,
            multiplier,
        });

        self.commit_with(&mut **store, staged, &mut || {
            self.ledger.burn_batch(account, item_ids, values).inspect_err(|e| {
                warn!(%account, error = %e, "pool: ledger refused burn");
            })
        })?;

        info!(%account, cycle, raw, ash, user_total, "pool: burn recorded");
        Ok(BurnReceipt {
            account: *account,
            cycle,
            ash,
            user_total,
            cycle_total,
            multiplier,
        })
    }

    // ------------------------------------------------------------------
    // Read queries
    // ------------------------------------------------------------------

    /// Cycle of the pool clock's current time.
    pub fn current_cycle(&self) -> Result<u64, PoolError> {
        Ok(self.clock.cycle_at((self.now)())?)
    }

    pub fn weight_of(&self, item_id: ItemId) -> u64 {
        self.weights.weight_of(item_id)
    }

    pub fn user_ash_per_cycle(&self, cycle: u64, account: &Address) -> Result<Ash, PoolError> {
        Ok(self.store.lock().user_ash(cycle, account)?)
    }

    pub fn total_ash_per_cycle(&self, cycle: u64) -> Result<Ash, PoolError> {
        Ok(self.store.lock().total_ash(cycle)?)
    }

    pub fn multiplier_info(&self, account: &Address) -> Result<MultiplierInfo, PoolError> {
        Ok(self.store.lock().multiplier(account)?.into())
    }

    pub fn is_leaf_consumed(&self, leaf: &Hash256) -> Result<bool, PoolError> {
        Ok(self.store.lock().is_leaf_consumed(leaf)?)
    }

    /// Replay-guard leaf of `(account, numerator)` under the pool's verifier.
    pub fn unlock_leaf(&self, account: &Address, numerator: u128) -> Hash256 {
        self.verifier.unlock_leaf(account, numerator)
    }

    /// `[start, end)` timestamps of `cycle`.
    pub fn cycle_window(&self, cycle: u64) -> (u64, u64) {
        self.clock.cycle_window(cycle)
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn clock(&self) -> &CycleClock {
        &self.clock
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Record of `account` as seen by this call: staged if written, else stored.
    fn staged_record(
        store: &dyn PoolStore,
        staged: &Staged,
        account: &Address,
    ) -> Result<MultiplierRecord, PoolError> {
        match staged.writes.multiplier(account) {
            Some(record) => Ok(record),
            None => Ok(store.multiplier(account)?),
        }
    }

    /// Stage a Merkle unlock: replay check, proof check, numerator set.
    ///
    /// The leaf is staged as consumed together with the numerator, so the
    /// two land or fail as one.
    fn stage_merkle_unlock(
        &self,
        store: &dyn PoolStore,
        staged: &mut Staged,
        account: &Address,
        numerator: u128,
        proof: &[Hash256],
    ) -> Result<(), PoolError> {
        let leaf = self.verifier.unlock_leaf(account, numerator);
        if staged.writes.is_leaf_staged(&leaf) || store.is_leaf_consumed(&leaf)? {
            warn!(%account, %leaf, "pool: replayed unlock leaf");
            return Err(ReplayError::LeafConsumed(leaf).into());
        }
        if !self.verifier.verify(proof, &self.config.merkle_root, &leaf) {
            debug!(%account, numerator, %leaf, "pool: proof rejected");
            return Err(ProofError::InvalidProof {
                account: *account,
                numerator,
                leaf,
            }
            .into());
        }

        let old = Self::staged_record(store, staged, account)?;
        let new = old.with_numerator(account, numerator)?;

        staged.writes.consume_leaf(leaf);
        staged.writes.set_multiplier(*account, new);
        staged.events.push(PoolEvent::LeafConsumed {
            account: *account,
            numerator,
            leaf,
        });
        staged.events.push(PoolEvent::MultiplierUpdated {
            account: *account,
            old: old.pack(),
            new: new.pack(),
        });
        Ok(())
    }

    /// Apply staged writes, then publish their events.
    fn commit(&self, store: &mut dyn PoolStore, staged: Staged) -> Result<(), PoolError> {
        self.commit_with(store, staged, &mut || Ok(()))
    }

    /// [`commit`](Self::commit) with `before_write` run by the store once the
    /// write is prepared.
    fn commit_with(
        &self,
        store: &mut dyn PoolStore,
        staged: Staged,
        before_write: &mut dyn FnMut() -> Result<(), LedgerError>,
    ) -> Result<(), PoolError> {
        store.apply_with(&staged.writes, before_write)?;
        for event in &staged.events {
            self.events.emit(event);
        }
        Ok(())
    }
}
