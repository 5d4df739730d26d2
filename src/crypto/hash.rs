//! SHA-256 based hashing
//!
//! Everything on-chain is committed to with double-SHA256; addresses use
//! HASH160 (SHA-256 followed by RIPEMD-160).

use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// 32-byte hash output, stored in internal (wire) byte order
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// All-zero hash, also the `Default`
    pub const fn zero() -> Self {
        Hash([0u8; 32])
    }

    /// Wrap bytes already in wire order
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    /// Parse a hex string without changing byte order
    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(hex)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Hash(arr))
    }

    /// Lowercase hex in stored byte order
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Raw bytes in stored order
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Byte-reversed copy (display order <-> wire order)
    pub fn reversed(&self) -> Self {
        let mut out = self.0;
        out.reverse();
        Hash(out)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::zero()
    }
}

/// Single SHA-256
pub fn sha256(data: &[u8]) -> Hash {
    Hash(Sha256::digest(data).into())
}

/// SHA-256 applied twice; sighashes, txids and Base58Check checksums
pub fn double_sha256(data: &[u8]) -> Hash {
    let first = Sha256::digest(data);
    Hash(Sha256::digest(first).into())
}

/// RIPEMD-160 of SHA-256
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let inner = Sha256::digest(data);
    Ripemd160::digest(inner).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_double_sha256_empty() {
        assert_eq!(
            double_sha256(b"").to_hex(),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn test_hash160_empty() {
        assert_eq!(
            hex::encode(hash160(b"")),
            "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"
        );
    }

    #[test]
    fn test_hex_roundtrip() {
        let hash = sha256(b"test");
        let recovered = Hash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(hash, recovered);
    }

    #[test]
    fn test_reversed() {
        let mut bytes = [0u8; 32];
        bytes[0] = 1;
        let hash = Hash(bytes);
        assert_eq!(hash.reversed().0[31], 1);
        assert_eq!(hash.reversed().reversed(), hash);
    }
}
