//! Unspent outputs as reported by the Electrum server, and input selection

mod selector;

pub use selector::*;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::Hash;

/// Reference to a previous output. `txid` is in display (big-endian) order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: Hash,
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: Hash, vout: u32) -> Self {
        Self { txid, vout }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

impl fmt::Debug for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutPoint({}:{})", self.txid, self.vout)
    }
}

/// Unspent transaction output, never mutated locally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub outpoint: OutPoint,
    /// Value in minor units
    pub value: u64,
    /// Confirmation height (0 = mempool)
    pub height: u64,
}

impl Utxo {
    pub fn new(txid: Hash, vout: u32, value: u64) -> Self {
        Self {
            outpoint: OutPoint::new(txid, vout),
            value,
            height: 0,
        }
    }
}

/// Sum of values, `None` on overflow
pub fn total_value<'a>(utxos: impl IntoIterator<Item = &'a Utxo>) -> Option<u64> {
    utxos
        .into_iter()
        .try_fold(0u64, |acc, utxo| acc.checked_add(utxo.value))
}
