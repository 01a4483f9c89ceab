//! Ash arithmetic: weighting and boosting.
//!
//! Pure functions over `u128`. The boost order is fixed: the scalar is
//! applied first, then the numerator with floor division. Under floor
//! division the two orders give different results, so the order is part of
//! the pool's contract.

use ash_core::error::ValidationError;
use ash_core::multiplier::{MultiplierRecord, Slot};
use ash_core::types::{Ash, ItemId};
use ash_core::weights::WeightTable;

/// Weighted sum `Σ values[i] * weight(item_ids[i])`.
///
/// # Errors
///
/// - [`ValidationError::InconsistentArrays`] if the lengths differ
/// - [`ValidationError::InvalidTokenId`] for an id with no weight
/// - [`ValidationError::InvalidTokenAmount`] for a zero quantity
/// - [`ValidationError::AshOverflow`] if the sum exceeds `u128`
pub fn raw_ash(
    weights: &WeightTable,
    item_ids: &[ItemId],
    values: &[u64],
) -> Result<Ash, ValidationError> {
    if item_ids.len() != values.len() {
        return Err(ValidationError::InconsistentArrays {
            ids: item_ids.len(),
            values: values.len(),
        });
    }

    let mut raw: Ash = 0;
    for (&item_id, &value) in item_ids.iter().zip(values) {
        let weight = weights.weight_of(item_id);
        if weight == 0 {
            return Err(ValidationError::InvalidTokenId(item_id));
        }
        if value == 0 {
            return Err(ValidationError::InvalidTokenAmount { item_id, amount: value });
        }
        // u64 * u64 always fits in u128.
        raw = raw
            .checked_add(value as u128 * weight as u128)
            .ok_or(ValidationError::AshOverflow)?;
    }
    Ok(raw)
}

/// Apply the account's boosts to `raw`.
///
/// `boosted = raw`, then `* scalar` if set, then `* numerator / denominator`
/// (floor) if set.
pub fn boost(raw: Ash, record: &MultiplierRecord, denominator: u128) -> Result<Ash, ValidationError> {
    let mut boosted = raw;
    if let Slot::Set(scalar) = record.scalar {
        boosted = boosted
            .checked_mul(scalar.get())
            .ok_or(ValidationError::AshOverflow)?;
    }
    if let Slot::Set(numerator) = record.numerator {
        boosted = boosted
            .checked_mul(numerator.get())
            .ok_or(ValidationError::AshOverflow)?
            / denominator;
    }
    Ok(boosted)
}
