//! Content-addressed, Schnorr-signed relay events

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::crypto::{sha256, SchnorrSignature, SignatureScheme, XOnlyPublicKey};
use crate::wallet::KeyMaterial;

use super::RelayError;

/// Replaceable profile metadata
pub const KIND_METADATA: u32 = 0;

pub type Tag = Vec<String>;

/// Event before its id and signature exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedEvent {
    pub pubkey: XOnlyPublicKey,
    pub created_at: u64,
    pub kind: u32,
    pub tags: Vec<Tag>,
    pub content: String,
}

/// Event as sent on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEvent {
    pub id: String,
    pub pubkey: String,
    pub created_at: u64,
    pub kind: u32,
    pub tags: Vec<Tag>,
    pub content: String,
    pub sig: String,
}

/// SHA-256 of `[0, pubkey, created_at, kind, tags, content]` in compact JSON
pub fn event_id(
    pubkey: &str,
    created_at: u64,
    kind: u32,
    tags: &[Tag],
    content: &str,
) -> Result<[u8; 32], RelayError> {
    let canonical = serde_json::to_string(&json!([0, pubkey, created_at, kind, tags, content]))?;
    Ok(*sha256(canonical.as_bytes()).as_bytes())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl UnsignedEvent {
    /// New event stamped with the current time
    pub fn new(pubkey: XOnlyPublicKey, kind: u32, tags: Vec<Tag>, content: String) -> Self {
        Self {
            pubkey,
            created_at: unix_now(),
            kind,
            tags,
            content,
        }
    }

    pub fn id(&self) -> Result<[u8; 32], RelayError> {
        event_id(
            &self.pubkey.to_hex(),
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        )
    }

    /// Sign with the key's Schnorr identity. The event pubkey is replaced
    /// by the signer's so the two can never disagree.
    pub fn sign(mut self, key: &KeyMaterial) -> Result<SignedEvent, RelayError> {
        self.pubkey = *key.relay_identity();
        let id = self.id()?;
        let sig = SignatureScheme::Schnorr.sign(&id, key.secret())?;
        Ok(SignedEvent {
            id: hex::encode(id),
            pubkey: self.pubkey.to_hex(),
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
            sig: hex::encode(sig.to_bytes()),
        })
    }
}

impl SignedEvent {
    /// Recompute the id and check the signature against `pubkey`
    pub fn verify(&self) -> Result<(), RelayError> {
        let id = event_id(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        )?;
        if hex::encode(id) != self.id {
            return Err(RelayError::IdMismatch);
        }

        let pubkey =
            XOnlyPublicKey::from_hex(&self.pubkey).map_err(|_| RelayError::InvalidSignature)?;
        let sig: [u8; 64] = hex::decode(&self.sig)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(RelayError::InvalidSignature)?;
        if !pubkey.verify(&id, &SchnorrSignature(sig)) {
            return Err(RelayError::InvalidSignature);
        }
        Ok(())
    }

    /// `["EVENT", event]` text frame
    pub fn to_relay_message(&self) -> Result<String, RelayError> {
        Ok(serde_json::to_string(&json!(["EVENT", self]))?)
    }
}
