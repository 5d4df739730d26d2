//! One signing contract over two schemes
//!
//! Coin transactions use ECDSA; relay events use BIP-340 Schnorr. Both sign
//! a 32-byte digest with the same secp256k1 scalar.

use thiserror::Error;

use super::{schnorr_sign, sign_digest, EcdsaSignature, NonceStrategy, SchnorrError, SecretKey, SigningError};

/// Errors from either scheme
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error(transparent)]
    Ecdsa(#[from] SigningError),
    #[error(transparent)]
    Schnorr(#[from] SchnorrError),
}

/// Which algorithm to sign with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    Ecdsa(NonceStrategy),
    Schnorr,
}

/// A signature produced by [`SignatureScheme::sign`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signature {
    Ecdsa(EcdsaSignature),
    Schnorr([u8; 64]),
}

impl SignatureScheme {
    pub fn sign(&self, digest: &[u8; 32], key: &SecretKey) -> Result<Signature, SignerError> {
        match self {
            SignatureScheme::Ecdsa(strategy) => {
                Ok(Signature::Ecdsa(sign_digest(key, digest, *strategy)?))
            }
            SignatureScheme::Schnorr => Ok(Signature::Schnorr(schnorr_sign(key, digest)?.0)),
        }
    }
}

impl Signature {
    /// Wire bytes: DER for ECDSA, raw 64 bytes for Schnorr
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Signature::Ecdsa(sig) => sig.to_der(),
            Signature::Schnorr(bytes) => bytes.to_vec(),
        }
    }
}
