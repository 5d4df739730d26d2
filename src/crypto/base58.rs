//! Base58Check codec
//!
//! Payload ‖ first four bytes of double-SHA256(payload), rendered in the
//! Bitcoin alphabet. Leading zero bytes map to leading '1' characters.

use thiserror::Error;

use super::double_sha256;

/// Length of the trailing checksum
pub const CHECKSUM_LEN: usize = 4;

/// Base58Check errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Base58Error {
    #[error("Invalid base58 character {character:?} at index {index}")]
    InvalidCharacter { character: char, index: usize },
    /// Also returned when fewer than four bytes decode
    #[error("Base58Check checksum mismatch")]
    ChecksumMismatch,
}

fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = double_sha256(payload);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest.0[..CHECKSUM_LEN]);
    out
}

/// Encode a payload with its 4-byte checksum
pub fn base58check_encode(payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(payload.len() + CHECKSUM_LEN);
    data.extend_from_slice(payload);
    data.extend_from_slice(&checksum(payload));
    bs58::encode(data).into_string()
}

/// Decode and verify; returns the payload without the checksum
pub fn base58check_decode(encoded: &str) -> Result<Vec<u8>, Base58Error> {
    let mut data = bs58::decode(encoded).into_vec().map_err(|e| match e {
        bs58::decode::Error::InvalidCharacter { character, index } => {
            Base58Error::InvalidCharacter { character, index }
        }
        bs58::decode::Error::NonAsciiCharacter { index } => Base58Error::InvalidCharacter {
            character: encoded[index..].chars().next().unwrap_or('\u{fffd}'),
            index,
        },
        _ => Base58Error::InvalidCharacter {
            character: '\u{fffd}',
            index: 0,
        },
    })?;

    if data.len() < CHECKSUM_LEN {
        return Err(Base58Error::ChecksumMismatch);
    }

    let split = data.len() - CHECKSUM_LEN;
    let expected = checksum(&data[..split]);
    if data[split..] != expected {
        return Err(Base58Error::ChecksumMismatch);
    }

    data.truncate(split);
    Ok(data)
}
