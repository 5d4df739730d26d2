//! Key material: WIF, public key and address derived from one scalar
//!
//! The private scalar never leaves [`KeyMaterial`] except through
//! [`KeyMaterial::to_wif`], which the caller invokes explicitly.

use thiserror::Error;
use zeroize::Zeroize;

use crate::constants::WIF_VERSION;
use crate::crypto::{
    base58check_decode, base58check_encode, x_only_public_key, Base58Error, SecretKey,
    SecretKeyError, XOnlyPublicKey,
};

use super::Address;

/// Key decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("Invalid WIF encoding: {0}")]
    Encoding(#[from] Base58Error),
    #[error("Invalid WIF prefix: expected 0x{expected:02x}, found 0x{found:02x}")]
    WrongVersion { expected: u8, found: u8 },
    #[error("Invalid WIF payload length: {0} bytes")]
    InvalidLength(usize),
    #[error("Invalid private key: {0}")]
    InvalidScalar(#[from] SecretKeyError),
    #[error("Public key derivation failed")]
    Derivation,
}

/// Strip whitespace and zero-width characters picked up by copy-paste
pub fn normalize_wif(wif: &str) -> String {
    wif.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}'))
        .collect()
}

/// Decode a WIF string to its private scalar.
///
/// A compressed-key WIF (trailing `0x01`) yields the same scalar; the
/// flag is ignored and addresses are still derived from the uncompressed
/// public key.
pub fn wif_decode(wif: &str) -> Result<SecretKey, KeyError> {
    let mut payload = base58check_decode(&normalize_wif(wif))?;
    let result = match payload.len() {
        33 | 34 if payload[0] == WIF_VERSION => {
            SecretKey::from_bytes(&payload[1..33]).map_err(KeyError::from)
        }
        33 | 34 => Err(KeyError::WrongVersion {
            expected: WIF_VERSION,
            found: payload[0],
        }),
        len => Err(KeyError::InvalidLength(len)),
    };
    payload.zeroize();
    result
}

/// Encode a private scalar as WIF
pub fn wif_encode(key: &SecretKey) -> String {
    let mut payload = Vec::with_capacity(33);
    payload.push(WIF_VERSION);
    payload.extend_from_slice(key.as_bytes());
    let wif = base58check_encode(&payload);
    payload.zeroize();
    wif
}

/// `04 ‖ x ‖ y` for a private scalar
pub fn private_key_to_public_key(key: &SecretKey) -> Result<[u8; 65], KeyError> {
    key.public_point()
        .to_uncompressed()
        .map_err(|_| KeyError::Derivation)
}

/// Address for a serialized public key
pub fn public_key_to_address(public_key: &[u8]) -> Address {
    Address::from_public_key(public_key)
}

/// Everything derived from one funding or player key
#[derive(Clone)]
pub struct KeyMaterial {
    secret: SecretKey,
    public_key: [u8; 65],
    address: Address,
    relay_identity: XOnlyPublicKey,
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("address", &self.address)
            .field("relay_identity", &self.relay_identity)
            .finish_non_exhaustive()
    }
}

impl KeyMaterial {
    pub fn from_secret(secret: SecretKey) -> Result<Self, KeyError> {
        let public_key = private_key_to_public_key(&secret)?;
        let address = public_key_to_address(&public_key);
        let relay_identity = x_only_public_key(&secret).map_err(|_| KeyError::Derivation)?;
        Ok(KeyMaterial {
            secret,
            public_key,
            address,
            relay_identity,
        })
    }

    /// Import a WIF (whitespace-tolerant)
    pub fn from_wif(wif: &str) -> Result<Self, KeyError> {
        Self::from_secret(wif_decode(wif)?)
    }

    /// Fresh random key, e.g. for a new player wallet
    pub fn generate() -> Result<Self, KeyError> {
        Self::from_secret(SecretKey::generate())
    }

    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }

    /// 65-byte uncompressed public key
    pub fn public_key(&self) -> &[u8; 65] {
        &self.public_key
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// x-only key identifying this wallet on social relays
    pub fn relay_identity(&self) -> &XOnlyPublicKey {
        &self.relay_identity
    }

    pub fn to_wif(&self) -> String {
        wif_encode(&self.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash160;

    const BITCOIN_WIKI_KEY: &str =
        "18e14a7b6a307f426a94f8114701e7c8e774e7f9a47e2c2035db29a206321725";

    #[test]
    fn test_known_public_key() {
        let key = SecretKey::from_hex(BITCOIN_WIKI_KEY).unwrap();
        let public_key = private_key_to_public_key(&key).unwrap();
        assert_eq!(
            hex::encode(public_key),
            "0450863ad64a87ae8a2fe83c1af1a8403cb53f53e486d8511dad8a04887e5b2352\
             2cd470243453a299fa9e77237716103abc11a1df38855ed6f2ee187e9c582ba6"
        );
        assert_eq!(
            hex::encode(hash160(&public_key)),
            "010966776006953d5567439e5e39f86a0d273bee"
        );
    }

    #[test]
    fn test_address_is_stable() {
        let key = SecretKey::from_hex(BITCOIN_WIKI_KEY).unwrap();
        let first = KeyMaterial::from_secret(key.clone()).unwrap();
        let second = KeyMaterial::from_secret(key).unwrap();
        assert_eq!(first.address(), second.address());
        assert_eq!(
            first.address().pubkey_hash(),
            &<[u8; 20]>::try_from(hex::decode("010966776006953d5567439e5e39f86a0d273bee").unwrap())
                .unwrap()
        );
        assert!(first.address().to_string().starts_with('L'));
    }

    #[test]
    fn test_wif_roundtrip() {
        let material = KeyMaterial::generate().unwrap();
        let wif = material.to_wif();
        let decoded = wif_decode(&wif).unwrap();
        assert_eq!(decoded.as_bytes(), material.secret().as_bytes());
        assert_eq!(wif_encode(&decoded), wif);
    }

    #[test]
    fn test_wif_whitespace_normalized() {
        let material = KeyMaterial::generate().unwrap();
        let wif = material.to_wif();
        let (head, tail) = wif.split_at(10);
        let dirty = format!(" \u{200B}{}\r\n\u{FEFF}{}\t", head, tail);
        let imported = KeyMaterial::from_wif(&dirty).unwrap();
        assert_eq!(imported.address(), material.address());
    }

    #[test]
    fn test_wif_wrong_prefix() {
        let mut payload = vec![0x80];
        payload.extend_from_slice(&[1u8; 32]);
        let wif = base58check_encode(&payload);
        assert_eq!(
            wif_decode(&wif).unwrap_err(),
            KeyError::WrongVersion {
                expected: WIF_VERSION,
                found: 0x80
            }
        );
    }

    #[test]
    fn test_compressed_wif_matches_uncompressed_twin() {
        let material = KeyMaterial::generate().unwrap();
        let mut payload = vec![WIF_VERSION];
        payload.extend_from_slice(material.secret().as_bytes());
        payload.push(0x01);
        let compressed = base58check_encode(&payload);
        assert_ne!(compressed, material.to_wif());

        let decoded = wif_decode(&compressed).unwrap();
        assert_eq!(decoded.as_bytes(), material.secret().as_bytes());

        let imported = KeyMaterial::from_wif(&compressed).unwrap();
        assert_eq!(imported.address(), material.address());
        assert_eq!(imported.public_key(), material.public_key());
        assert_eq!(imported.to_wif(), material.to_wif());
    }

    #[test]
    fn test_wif_bad_length() {
        let mut payload = vec![WIF_VERSION];
        payload.extend_from_slice(&[1u8; 31]);
        let wif = base58check_encode(&payload);
        assert_eq!(wif_decode(&wif).unwrap_err(), KeyError::InvalidLength(32));
    }

    #[test]
    fn test_wif_bad_checksum() {
        let wif = KeyMaterial::generate().unwrap().to_wif();
        let mut chars: Vec<char> = wif.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == 'a' { 'b' } else { 'a' };
        let corrupted: String = chars.into_iter().collect();
        assert!(matches!(
            wif_decode(&corrupted),
            Err(KeyError::Encoding(Base58Error::ChecksumMismatch))
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let material = KeyMaterial::generate().unwrap();
        let rendered = format!("{:?}", material);
        assert!(!rendered.contains(&material.secret().to_hex()));
    }
}
