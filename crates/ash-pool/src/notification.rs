//! Notifications delivered by token ledgers.
//!
//! A ledger calls into the pool as part of moving items; the pool answers
//! with an acceptance code or an error, and the ledger aborts the transfer
//! unless it gets the code back.

use ash_core::types::{Address, ItemId};

/// A batch of items received for destruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchNotification {
    /// Contract delivering the notification.
    pub source: Address,
    /// Account that initiated the transfer.
    pub operator: Address,
    /// Previous holder of the items; credited with the ash.
    pub from: Address,
    pub item_ids: Vec<ItemId>,
    pub values: Vec<u64>,
    pub data: Vec<u8>,
}

/// A single item received, expected to be the unlock item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemNotification {
    pub source: Address,
    pub operator: Address,
    /// Account whose token multiplier is unlocked.
    pub from: Address,
    pub item_id: ItemId,
    pub value: u64,
    /// Empty, or an encoded [`UnlockPayload`](crate::payload::UnlockPayload).
    pub data: Vec<u8>,
}
