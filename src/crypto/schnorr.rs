//! BIP-340 Schnorr signatures for relay events
//!
//! Shares the secp256k1 key with the coin wallet; only the signature
//! algorithm differs. Backed by k256.

use k256::schnorr::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::SecretKey;

/// Schnorr errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchnorrError {
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

/// 32-byte x-only public key
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XOnlyPublicKey(pub [u8; 32]);

/// 64-byte Schnorr signature
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SchnorrSignature(pub [u8; 64]);

fn signing_key(secret: &SecretKey) -> Result<SigningKey, SchnorrError> {
    SigningKey::from_bytes(secret.as_bytes()).map_err(|_| SchnorrError::InvalidPrivateKey)
}

/// Derive the x-only public key for a secret
pub fn x_only_public_key(secret: &SecretKey) -> Result<XOnlyPublicKey, SchnorrError> {
    let key = signing_key(secret)?;
    Ok(XOnlyPublicKey(key.verifying_key().to_bytes().into()))
}

/// Sign a 32-byte digest with fresh auxiliary randomness
pub fn schnorr_sign(secret: &SecretKey, digest: &[u8; 32]) -> Result<SchnorrSignature, SchnorrError> {
    let mut aux = [0u8; 32];
    OsRng.fill_bytes(&mut aux);
    schnorr_sign_with_aux(secret, digest, &aux)
}

/// Sign with caller-supplied auxiliary randomness
pub fn schnorr_sign_with_aux(
    secret: &SecretKey,
    digest: &[u8; 32],
    aux: &[u8; 32],
) -> Result<SchnorrSignature, SchnorrError> {
    let key = signing_key(secret)?;
    let signature: Signature = key
        .sign_raw(digest, aux)
        .map_err(|e| SchnorrError::SigningFailed(e.to_string()))?;
    Ok(SchnorrSignature(signature.to_bytes()))
}

impl XOnlyPublicKey {
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, SchnorrError> {
        VerifyingKey::from_bytes(bytes).map_err(|_| SchnorrError::InvalidPublicKey)?;
        Ok(XOnlyPublicKey(*bytes))
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, SchnorrError> {
        let bytes = hex::decode(hex_str).map_err(|_| SchnorrError::InvalidPublicKey)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| SchnorrError::InvalidPublicKey)?;
        Self::from_bytes(&arr)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Verify a signature over a 32-byte digest
    pub fn verify(&self, digest: &[u8; 32], signature: &SchnorrSignature) -> bool {
        let verifying_key = match VerifyingKey::from_bytes(&self.0) {
            Ok(vk) => vk,
            Err(_) => return false,
        };

        let sig = match Signature::try_from(signature.0.as_slice()) {
            Ok(s) => s,
            Err(_) => return false,
        };

        verifying_key.verify_raw(digest, &sig).is_ok()
    }
}

impl SchnorrSignature {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for XOnlyPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "XOnlyPublicKey({})", hex::encode(self.0))
    }
}

impl std::fmt::Debug for SchnorrSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SchnorrSignature({})", hex::encode(self.0))
    }
}
