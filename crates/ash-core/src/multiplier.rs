//! Per-account multiplier record and its packed 256-bit word.
//!
//! Each account carries two independently unlockable boosts:
//! - the proof-gated game multiplier numerator (high 128 bits of the word)
//! - the burn-gated token multiplier scalar (low 128 bits)
//!
//! Both start [`Slot::Unset`] and may become [`Slot::Set`] exactly once.
//! `Set` holds a [`NonZeroU128`], so "set to zero" cannot be represented and
//! the word `0` unambiguously means "nothing unlocked".

use std::fmt;
use std::num::NonZeroU128;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{HexError, PoolError, ReplayError, ValidationError};
use crate::types::Address;

/// A set-once boost value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Slot {
    #[default]
    Unset,
    Set(NonZeroU128),
}

impl Slot {
    /// Decode a raw field: zero is `Unset`.
    pub fn from_raw(raw: u128) -> Self {
        NonZeroU128::new(raw).map_or(Self::Unset, Self::Set)
    }

    /// Raw field value; `Unset` is zero.
    pub fn get(&self) -> u128 {
        match self {
            Self::Unset => 0,
            Self::Set(v) => v.get(),
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }
}

/// The two logical boost fields of one account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MultiplierRecord {
    /// Proof-gated numerator, scaled by the pool denominator.
    pub numerator: Slot,
    /// Burn-gated integer scalar.
    pub scalar: Slot,
}

impl MultiplierRecord {
    /// Return a copy with the numerator set.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::ZeroNumerator`] if `value` is zero
    /// - [`ReplayError::AlreadySet`] if the numerator is already set
    pub fn with_numerator(&self, account: &Address, value: u128) -> Result<Self, PoolError> {
        if let Slot::Set(current) = self.numerator {
            return Err(ReplayError::AlreadySet {
                account: *account,
                current: current.get(),
            }
            .into());
        }
        let value = NonZeroU128::new(value).ok_or(ValidationError::ZeroNumerator)?;
        Ok(Self {
            numerator: Slot::Set(value),
            scalar: self.scalar,
        })
    }

    /// Return a copy with the scalar set to the pool's fixed constant.
    ///
    /// # Errors
    ///
    /// - [`ReplayError::AlreadyUnlocked`] if the scalar is already set
    pub fn with_scalar(&self, account: &Address, value: NonZeroU128) -> Result<Self, ReplayError> {
        if let Slot::Set(current) = self.scalar {
            return Err(ReplayError::AlreadyUnlocked {
                account: *account,
                current: current.get(),
            });
        }
        Ok(Self {
            numerator: self.numerator,
            scalar: Slot::Set(value),
        })
    }

    /// Pack into the 256-bit word: numerator high, scalar low, big-endian.
    pub fn pack(&self) -> MultiplierWord {
        let mut word = [0u8; 32];
        word[..16].copy_from_slice(&self.numerator.get().to_be_bytes());
        word[16..].copy_from_slice(&self.scalar.get().to_be_bytes());
        MultiplierWord(word)
    }
}

/// Packed multiplier word as persisted and reported in events.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash,
    bincode::Encode, bincode::Decode,
)]
pub struct MultiplierWord(pub [u8; 32]);

impl MultiplierWord {
    pub const ZERO: Self = Self([0u8; 32]);

    /// High 128 bits.
    pub fn numerator(&self) -> u128 {
        let mut hi = [0u8; 16];
        hi.copy_from_slice(&self.0[..16]);
        u128::from_be_bytes(hi)
    }

    /// Low 128 bits.
    pub fn scalar(&self) -> u128 {
        let mut lo = [0u8; 16];
        lo.copy_from_slice(&self.0[16..]);
        u128::from_be_bytes(lo)
    }

    pub fn unpack(&self) -> MultiplierRecord {
        MultiplierRecord {
            numerator: Slot::from_raw(self.numerator()),
            scalar: Slot::from_raw(self.scalar()),
        }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for MultiplierWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Serialize for MultiplierWord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MultiplierWord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let hex_str = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(hex_str).map_err(|_| serde::de::Error::custom(HexError::InvalidHex))?;
        let got = bytes.len();
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom(HexError::InvalidLength { expected: 32, got }))?;
        Ok(Self(arr))
    }
}

/// Read view of an account's multipliers: `(word, numerator, scalar)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplierInfo {
    pub word: MultiplierWord,
    pub numerator: u128,
    pub scalar: u128,
}

impl From<MultiplierRecord> for MultiplierInfo {
    fn from(record: MultiplierRecord) -> Self {
        Self {
            word: record.pack(),
            numerator: record.numerator.get(),
            scalar: record.scalar.get(),
        }
    }
}
