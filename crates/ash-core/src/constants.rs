//! Pool constants.

/// Fixed-point base for the proof-gated numerator: a numerator of
/// `DENOMINATOR` is a 1.0x boost, `2 * DENOMINATOR` is 2.0x.
pub const DENOMINATOR: u64 = 10_000;

/// Acceptance code returned for a batch burn notification.
///
/// The token ledger aborts the destruction unless it receives exactly
/// this value.
pub const BATCH_ACCEPTED: [u8; 4] = [0xbc, 0x19, 0x7c, 0x81];

/// Acceptance code returned for a single-item unlock notification.
pub const SINGLE_ACCEPTED: [u8; 4] = [0xf2, 0x3a, 0x6e, 0x61];

/// Quantity of the unlock item that must be received for a scalar unlock.
pub const UNLOCK_ITEM_AMOUNT: u64 = 1;

/// Number of events retained by the in-memory event log.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 1024;
