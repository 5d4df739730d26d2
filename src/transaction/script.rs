//! Pay-to-pubkey-hash scripts

use serde::{Deserialize, Serialize};
use std::fmt;

pub const OP_DUP: u8 = 0x76;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;

/// Raw script bytes
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Script(pub Vec<u8>);

impl Script {
    pub fn empty() -> Self {
        Script(Vec::new())
    }

    /// `OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG`
    pub fn p2pkh(pubkey_hash: &[u8; 20]) -> Self {
        let mut bytes = Vec::with_capacity(25);
        bytes.extend_from_slice(&[OP_DUP, OP_HASH160, 20]);
        bytes.extend_from_slice(pubkey_hash);
        bytes.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        Script(bytes)
    }

    /// `push(sig ‖ hashtype) push(pubkey)`
    pub fn p2pkh_spend(signature_with_hashtype: &[u8], public_key: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(signature_with_hashtype.len() + public_key.len() + 2);
        push_data(&mut bytes, signature_with_hashtype);
        push_data(&mut bytes, public_key);
        Script(bytes)
    }

    /// Hash paid to, if this is a standard P2PKH output script
    pub fn p2pkh_hash(&self) -> Option<[u8; 20]> {
        match self.0.as_slice() {
            [OP_DUP, OP_HASH160, 20, hash @ .., OP_EQUALVERIFY, OP_CHECKSIG] if hash.len() == 20 => {
                let mut out = [0u8; 20];
                out.copy_from_slice(hash);
                Some(out)
            }
            _ => None,
        }
    }

    pub fn is_p2pkh(&self) -> bool {
        self.p2pkh_hash().is_some()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

/// Smallest push opcode for `data`
pub fn push_data(buf: &mut Vec<u8>, data: &[u8]) {
    let len = data.len();
    if len < OP_PUSHDATA1 as usize {
        buf.push(len as u8);
    } else if len <= 0xff {
        buf.push(OP_PUSHDATA1);
        buf.push(len as u8);
    } else {
        buf.push(OP_PUSHDATA2);
        buf.extend_from_slice(&(len as u16).to_le_bytes());
    }
    buf.extend_from_slice(data);
}
