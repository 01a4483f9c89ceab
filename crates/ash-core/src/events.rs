//! Pool events and the in-memory event log.
//!
//! Events are emitted only after a call has been committed; an aborted call
//! emits nothing.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::Serialize;

use crate::constants::DEFAULT_EVENT_LOG_CAPACITY;
use crate::multiplier::MultiplierWord;
use crate::traits::EventSink;
use crate::types::{Address, Ash, Hash256, ItemId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PoolEvent {
    /// One of the account's multiplier fields went from unset to set.
    MultiplierUpdated {
        account: Address,
        old: MultiplierWord,
        new: MultiplierWord,
    },
    /// A Merkle leaf was consumed by a successful unlock.
    LeafConsumed {
        account: Address,
        numerator: u128,
        leaf: Hash256,
    },
    /// A burn was aggregated into the cycle counters.
    AshRecorded {
        account: Address,
        cycle: u64,
        item_ids: Vec<ItemId>,
        values: Vec<u64>,
        ash: Ash,
        user_total: Ash,
        cycle_total: Ash,
        multiplier: MultiplierWord,
    },
}

/// Bounded in-memory sink keeping the most recent events.
#[derive(Debug)]
pub struct MemoryEventLog {
    events: Mutex<VecDeque<PoolEvent>>,
    capacity: usize,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_LOG_CAPACITY)
    }

    /// A log that drops the oldest event once `capacity` is reached.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_LOG_CAPACITY))),
            capacity: capacity.max(1),
        }
    }

    /// All retained events, oldest first.
    pub fn events(&self) -> Vec<PoolEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Up to `limit` most recent events, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<PoolEvent> {
        let events = self.events.lock();
        let skip = events.len().saturating_sub(limit);
        events.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl Default for MemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for MemoryEventLog {
    fn emit(&self, event: &PoolEvent) {
        let mut events = self.events.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event.clone());
    }
}
