//! Legacy pay-to-pubkey-hash addresses
//!
//! Address = Base58Check(ADDRESS_VERSION ‖ HASH160(uncompressed pubkey)).

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::ADDRESS_VERSION;
use crate::crypto::{base58check_decode, base58check_encode, hash160, Base58Error};

/// Address errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Invalid address encoding: {0}")]
    Encoding(#[from] Base58Error),
    #[error("Invalid address version: expected 0x{expected:02x}, found 0x{found:02x}")]
    WrongVersion { expected: u8, found: u8 },
    #[error("Invalid address length: {0} bytes")]
    InvalidLength(usize),
}

/// A P2PKH address for this coin
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    pubkey_hash: [u8; 20],
}

impl Address {
    pub fn from_pubkey_hash(pubkey_hash: [u8; 20]) -> Self {
        Address { pubkey_hash }
    }

    /// Derive from a serialized public key
    pub fn from_public_key(public_key: &[u8]) -> Self {
        Address {
            pubkey_hash: hash160(public_key),
        }
    }

    pub fn pubkey_hash(&self) -> &[u8; 20] {
        &self.pubkey_hash
    }

    /// Decode and check the version byte
    pub fn parse(encoded: &str) -> Result<Self, AddressError> {
        let payload = base58check_decode(encoded.trim())?;
        if payload.len() != 21 {
            return Err(AddressError::InvalidLength(payload.len()));
        }
        if payload[0] != ADDRESS_VERSION {
            return Err(AddressError::WrongVersion {
                expected: ADDRESS_VERSION,
                found: payload[0],
            });
        }
        let mut pubkey_hash = [0u8; 20];
        pubkey_hash.copy_from_slice(&payload[1..]);
        Ok(Address { pubkey_hash })
    }

    pub fn encode(&self) -> String {
        let mut payload = Vec::with_capacity(21);
        payload.push(ADDRESS_VERSION);
        payload.extend_from_slice(&self.pubkey_hash);
        base58check_encode(&payload)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.encode())
    }
}
