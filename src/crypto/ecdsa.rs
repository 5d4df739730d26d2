//! ECDSA over secp256k1 with low-S, DER-encoded output
//!
//! Nonces come from RFC 6979 (HMAC-SHA256) by default. The coin's legacy
//! `k = (z + d) mod N` derivation is kept behind [`NonceStrategy::Legacy`]
//! for byte-for-byte compatibility with transactions it already produced.

use hmac::{Hmac, Mac};
use num_bigint::BigUint;
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroize;

use super::{curve_order, generator, half_order, mod_inverse, to_be_32, Point, SecretKey};

type HmacSha256 = Hmac<Sha256>;

/// Signing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    #[error("Degenerate signature scalar ({0} is zero)")]
    InvalidScalar(&'static str),
    #[error("Invalid DER signature encoding")]
    InvalidDer,
}

/// How the per-signature nonce is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonceStrategy {
    /// RFC 6979 deterministic nonce
    #[default]
    Rfc6979,
    /// `k = (z + d) mod N`, as produced by the coin's earlier tooling
    Legacy,
}

/// An `(r, s)` pair with `s ≤ N/2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcdsaSignature {
    pub r: BigUint,
    pub s: BigUint,
}

/// Minimal DER integer body: no redundant leading zeros, but a 0x00 pad
/// when the high bit would otherwise read as negative.
fn der_integer(value: &BigUint) -> Vec<u8> {
    let mut bytes = to_be_32(value).to_vec();
    while bytes.len() > 1 && bytes[0] == 0 {
        bytes.remove(0);
    }
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0);
    }
    bytes
}

impl EcdsaSignature {
    /// `30 len 02 rlen r 02 slen s`
    pub fn to_der(&self) -> Vec<u8> {
        let r = der_integer(&self.r);
        let s = der_integer(&self.s);
        let mut der = Vec::with_capacity(6 + r.len() + s.len());
        der.push(0x30);
        der.push((4 + r.len() + s.len()) as u8);
        der.push(0x02);
        der.push(r.len() as u8);
        der.extend_from_slice(&r);
        der.push(0x02);
        der.push(s.len() as u8);
        der.extend_from_slice(&s);
        der
    }

    pub fn from_der(der: &[u8]) -> Result<Self, SigningError> {
        fn read_int(bytes: &[u8], at: usize) -> Result<(BigUint, usize), SigningError> {
            if bytes.get(at) != Some(&0x02) {
                return Err(SigningError::InvalidDer);
            }
            let len = *bytes.get(at + 1).ok_or(SigningError::InvalidDer)? as usize;
            let body = bytes
                .get(at + 2..at + 2 + len)
                .ok_or(SigningError::InvalidDer)?;
            if body.is_empty() {
                return Err(SigningError::InvalidDer);
            }
            Ok((BigUint::from_bytes_be(body), at + 2 + len))
        }

        if der.len() < 8 || der[0] != 0x30 || der[1] as usize != der.len() - 2 {
            return Err(SigningError::InvalidDer);
        }
        let (r, next) = read_int(der, 2)?;
        let (s, end) = read_int(der, next)?;
        if end != der.len() {
            return Err(SigningError::InvalidDer);
        }
        Ok(EcdsaSignature { r, s })
    }
}

/// Iterator over RFC 6979 nonce candidates (HMAC-SHA256, qlen = 256)
struct Rfc6979 {
    k: [u8; 32],
    v: [u8; 32],
    first: bool,
}

impl Rfc6979 {
    fn hmac(key: &[u8; 32], parts: &[&[u8]]) -> [u8; 32] {
        let mut mac = match HmacSha256::new_from_slice(key) {
            Ok(mac) => mac,
            // HMAC accepts keys of any length
            Err(_) => unreachable!(),
        };
        for part in parts {
            mac.update(part);
        }
        mac.finalize().into_bytes().into()
    }

    fn new(secret: &[u8; 32], digest: &BigUint) -> Self {
        let h1 = to_be_32(&(digest % curve_order()));
        let mut v = [0x01u8; 32];
        let mut k = [0x00u8; 32];
        k = Self::hmac(&k, &[&v, &[0x00], secret, &h1]);
        v = Self::hmac(&k, &[&v]);
        k = Self::hmac(&k, &[&v, &[0x01], secret, &h1]);
        v = Self::hmac(&k, &[&v]);
        Rfc6979 { k, v, first: true }
    }

    fn next_candidate(&mut self) -> BigUint {
        loop {
            if !self.first {
                self.k = Self::hmac(&self.k, &[&self.v, &[0x00]]);
                self.v = Self::hmac(&self.k, &[&self.v]);
            }
            self.first = false;
            self.v = Self::hmac(&self.k, &[&self.v]);
            let candidate = BigUint::from_bytes_be(&self.v);
            if candidate != BigUint::ZERO && &candidate < curve_order() {
                return candidate;
            }
        }
    }
}

impl Drop for Rfc6979 {
    fn drop(&mut self) {
        self.k.zeroize();
        self.v.zeroize();
    }
}

/// Compute `(r, s)` for a given nonce; `None` on a zero component
fn sign_with_nonce(
    k: &BigUint,
    z: &BigUint,
    d: &BigUint,
) -> Result<EcdsaSignature, SigningError> {
    let n = curve_order();
    let r = match generator().mul(k).x() {
        Some(x) => x % n,
        None => return Err(SigningError::InvalidScalar("r")),
    };
    if r == BigUint::ZERO {
        return Err(SigningError::InvalidScalar("r"));
    }
    let k_inv = mod_inverse(k, n).ok_or(SigningError::InvalidScalar("k"))?;
    let s = k_inv * ((z + &r * d) % n) % n;
    if s == BigUint::ZERO {
        return Err(SigningError::InvalidScalar("s"));
    }
    let s = if &s > half_order() { n - s } else { s };
    Ok(EcdsaSignature { r, s })
}

/// Sign a 32-byte message digest
pub fn sign_digest(
    key: &SecretKey,
    digest: &[u8; 32],
    strategy: NonceStrategy,
) -> Result<EcdsaSignature, SigningError> {
    let z = BigUint::from_bytes_be(digest);
    let d = key.scalar();

    match strategy {
        NonceStrategy::Rfc6979 => {
            let mut nonces = Rfc6979::new(key.as_bytes(), &z);
            loop {
                let k = nonces.next_candidate();
                match sign_with_nonce(&k, &z, &d) {
                    Ok(signature) => return Ok(signature),
                    Err(SigningError::InvalidScalar(_)) => continue,
                    Err(e) => return Err(e),
                }
            }
        }
        NonceStrategy::Legacy => {
            let k = (&z + &d) % curve_order();
            if k == BigUint::ZERO {
                return Err(SigningError::InvalidScalar("k"));
            }
            sign_with_nonce(&k, &z, &d)
        }
    }
}

/// Standard verification: `x(u1·G + u2·Q) ≡ r (mod N)`
pub fn verify_digest(public_key: &Point, digest: &[u8; 32], signature: &EcdsaSignature) -> bool {
    let n = curve_order();
    let EcdsaSignature { r, s } = signature;
    if *r == BigUint::ZERO || r >= n || *s == BigUint::ZERO || s >= n {
        return false;
    }
    if public_key.is_infinity() || !public_key.is_on_curve() {
        return false;
    }
    let z = BigUint::from_bytes_be(digest);
    let w = match mod_inverse(s, n) {
        Some(w) => w,
        None => return false,
    };
    let u1 = (&z * &w) % n;
    let u2 = (r * &w) % n;
    let point = generator().mul(&u1).add(&public_key.mul(&u2));
    match point.x() {
        Some(x) => &(x % n) == r,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256;
    use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};

    fn key(hex_str: &str) -> SecretKey {
        SecretKey::from_hex(hex_str).unwrap()
    }

    #[test]
    fn test_sign_verify() {
        let sk = key("0c28fca386c7a227600b2fe50b7cae11ec86d3bf1fbe471be89827e19d72aa1d");
        let digest = sha256(b"payout").0;
        let sig = sign_digest(&sk, &digest, NonceStrategy::Rfc6979).unwrap();
        assert!(verify_digest(&sk.public_point(), &digest, &sig));
        assert!(&sig.s <= half_order());
    }

    #[test]
    fn test_wrong_digest_fails() {
        let sk = SecretKey::generate();
        let sig = sign_digest(&sk, &sha256(b"one").0, NonceStrategy::Rfc6979).unwrap();
        assert!(!verify_digest(&sk.public_point(), &sha256(b"two").0, &sig));
    }

    #[test]
    fn test_legacy_nonce_signs_and_verifies() {
        let sk = key("0000000000000000000000000000000000000000000000000000000000000001");
        let digest = sha256(b"legacy").0;
        let sig = sign_digest(&sk, &digest, NonceStrategy::Legacy).unwrap();
        assert!(verify_digest(&sk.public_point(), &digest, &sig));

        let z = BigUint::from_bytes_be(&digest);
        let k = (z + 1u8) % curve_order();
        let expected_r = generator().mul(&k).x().unwrap() % curve_order();
        assert_eq!(sig.r, expected_r);
    }

    #[test]
    fn test_legacy_zero_nonce_is_fatal() {
        // z = N - d makes k = 0
        let sk = key("0000000000000000000000000000000000000000000000000000000000000001");
        let z = curve_order() - BigUint::from(1u8);
        let digest = to_be_32(&z);
        assert_eq!(
            sign_digest(&sk, &digest, NonceStrategy::Legacy),
            Err(SigningError::InvalidScalar("k"))
        );
    }

    #[test]
    fn test_rfc6979_matches_k256() {
        let sk = key("c9afa9d845ba75166b5c215767b1d6934e50c3db36e89b127b8a622b120f6721");
        let digest = sha256(b"sample").0;
        let ours = sign_digest(&sk, &digest, NonceStrategy::Rfc6979).unwrap();

        let signing_key = k256::ecdsa::SigningKey::from_slice(sk.as_bytes()).unwrap();
        let theirs: k256::ecdsa::Signature = signing_key.sign_prehash(&digest).unwrap();
        assert_eq!(ours.to_der(), theirs.to_der().as_bytes());
    }

    #[test]
    fn test_k256_accepts_our_signature() {
        let sk = SecretKey::generate();
        let digest = sha256(b"cross-check").0;
        let sig = sign_digest(&sk, &digest, NonceStrategy::Legacy).unwrap();

        let signing_key = k256::ecdsa::SigningKey::from_slice(sk.as_bytes()).unwrap();
        let parsed = k256::ecdsa::Signature::from_der(&sig.to_der()).unwrap();
        assert!(signing_key
            .verifying_key()
            .verify_prehash(&digest, &parsed)
            .is_ok());
    }

    #[test]
    fn test_der_minimal_encoding() {
        let sig = EcdsaSignature {
            r: BigUint::from(0x80u8),
            s: BigUint::from(0x7fu8),
        };
        assert_eq!(
            sig.to_der(),
            vec![0x30, 0x07, 0x02, 0x02, 0x00, 0x80, 0x02, 0x01, 0x7f]
        );
        assert_eq!(EcdsaSignature::from_der(&sig.to_der()).unwrap(), sig);
    }

    #[test]
    fn test_der_rejects_garbage() {
        assert_eq!(
            EcdsaSignature::from_der(&[0x30, 0x01, 0x02]),
            Err(SigningError::InvalidDer)
        );
    }
}
