//! Optional payload carried by an unlock-item receipt.
//!
//! A receipt's `data` is either empty (scalar unlock only) or the bincode
//! encoding of an [`UnlockPayload`], which asks the pool to perform a Merkle
//! unlock in the same call.

use ash_core::error::ValidationError;
use ash_core::types::Hash256;

/// Upper bound on an encoded payload. Bounds proof allocation during decode.
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024;

/// `(proof, numerator)` for a combined unlock.
#[derive(Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct UnlockPayload {
    pub proof: Vec<Hash256>,
    pub numerator: u128,
}

impl UnlockPayload {
    /// Encode for the `data` field of an item notification.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ValidationError> {
        let config = bincode::config::standard().with_limit::<MAX_PAYLOAD_BYTES>();
        bincode::encode_to_vec(self, config)
            .map_err(|e| ValidationError::MalformedPayload(e.to_string()))
    }

    /// Decode `data`. Empty data means no payload.
    ///
    /// # Errors
    ///
    /// [`ValidationError::MalformedPayload`] for undecodable data or trailing bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Option<Self>, ValidationError> {
        if data.is_empty() {
            return Ok(None);
        }
        let config = bincode::config::standard().with_limit::<MAX_PAYLOAD_BYTES>();
        let (payload, read): (Self, usize) = bincode::decode_from_slice(data, config)
            .map_err(|e| ValidationError::MalformedPayload(e.to_string()))?;
        if read != data.len() {
            return Err(ValidationError::MalformedPayload(format!(
                "{} trailing bytes",
                data.len() - read
            )));
        }
        Ok(Some(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UnlockPayload {
        UnlockPayload {
            proof: vec![Hash256([1; 32]), Hash256([2; 32])],
            numerator: 20_000,
        }
    }

    #[test]
    fn empty_data_is_no_payload() {
        assert_eq!(UnlockPayload::from_bytes(&[]), Ok(None));
    }

    #[test]
    fn decodes_what_it_encodes() {
        let bytes = sample().to_bytes().unwrap();
        assert_eq!(UnlockPayload::from_bytes(&bytes), Ok(Some(sample())));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes.push(0);
        assert!(matches!(
            UnlockPayload::from_bytes(&bytes),
            Err(ValidationError::MalformedPayload(_))
        ));
    }

    #[test]
    fn garbage_rejected() {
        assert!(matches!(
            UnlockPayload::from_bytes(&[0xFF; 3]),
            Err(ValidationError::MalformedPayload(_))
        ));
    }
}
