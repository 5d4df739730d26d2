//! Private scalar held inside the signing boundary

use num_bigint::BigUint;
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{curve_order, generator, Point};

/// Secret key errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecretKeyError {
    #[error("Private key must be 32 bytes, got {0}")]
    InvalidLength(usize),
    #[error("Private key is zero or not below the curve order")]
    OutOfRange,
    #[error("Private key is not valid hex")]
    InvalidHex,
}

/// 32-byte secp256k1 private scalar in `[1, N)`
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; 32]);

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey([REDACTED])")
    }
}

impl SecretKey {
    /// Generate a new random private key
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        loop {
            OsRng.fill_bytes(&mut bytes);
            if let Ok(key) = Self::from_bytes(&bytes) {
                bytes.zeroize();
                return key;
            }
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SecretKeyError> {
        if bytes.len() != 32 {
            return Err(SecretKeyError::InvalidLength(bytes.len()));
        }
        let scalar = BigUint::from_bytes_be(bytes);
        if scalar == BigUint::ZERO || &scalar >= curve_order() {
            return Err(SecretKeyError::OutOfRange);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Ok(SecretKey(arr))
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, SecretKeyError> {
        let mut bytes = hex::decode(hex_str.trim()).map_err(|_| SecretKeyError::InvalidHex)?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The scalar as an integer
    pub fn scalar(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }

    /// `d·G`
    pub fn public_point(&self) -> Point {
        generator().mul(&self.scalar())
    }
}
