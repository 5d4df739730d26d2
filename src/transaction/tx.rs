//! Legacy transaction layout with the coin's `nTime` field
//!
//! ```text
//! version(4) ‖ nTime(4) ‖ varint n_in ‖ inputs ‖ varint n_out ‖ outputs ‖ locktime(4)
//! input  = prev txid (wire order, 32) ‖ vout(4) ‖ varint len ‖ scriptSig ‖ sequence(4)
//! output = value(8) ‖ varint len ‖ scriptPubKey
//! ```
//!
//! Integers are little-endian throughout.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{SEQUENCE_FINAL, SIGHASH_ALL, TX_VERSION};
use crate::crypto::{double_sha256, Hash, SignerError};
use crate::utxo::{OutPoint, SelectionError};

use super::{write_varint, ByteReader, Script};

/// Transaction construction and parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    #[error("Unexpected end of data: need {needed} bytes, {remaining} left")]
    UnexpectedEof { needed: usize, remaining: usize },
    #[error("Length prefix {0} exceeds remaining data")]
    LengthOverflow(u64),
    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),
    #[error("Invalid transaction hex")]
    InvalidHex,
    #[error("Output index {vout} out of range ({outputs} outputs)")]
    OutputIndexOutOfRange { vout: u32, outputs: usize },
    #[error("Input index {index} out of range ({inputs} inputs)")]
    InputIndexOutOfRange { index: usize, inputs: usize },
    #[error("Previous output {0} is not pay-to-pubkey-hash")]
    NotP2pkh(OutPoint),
    #[error("Previous output {0} is not paid to the funding key")]
    ForeignOutput(OutPoint),
    #[error("Previous transaction hashes to {found}, expected {expected}")]
    PrevTxMismatch { expected: Hash, found: Hash },
    #[error("Missing previous output script for {0}")]
    MissingPrevout(OutPoint),
    #[error("No recipients")]
    NoRecipients,
    #[error("Amount must be positive")]
    ZeroAmount,
    #[error("Amount overflow")]
    AmountOverflow,
    #[error("Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },
    #[error("Input selection failed: {0}")]
    Selection(#[from] SelectionError),
    #[error("Signing failed: {0}")]
    Signing(#[from] SignerError),
}

/// Transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub previous_output: OutPoint,
    pub script_sig: Script,
    pub sequence: u32,
}

impl TxIn {
    /// Unsigned input spending `previous_output`
    pub fn new(previous_output: OutPoint) -> Self {
        Self {
            previous_output,
            script_sig: Script::empty(),
            sequence: SEQUENCE_FINAL,
        }
    }

    fn write(&self, buf: &mut Vec<u8>, script_sig: &Script) {
        buf.extend_from_slice(self.previous_output.txid.reversed().as_bytes());
        buf.extend_from_slice(&self.previous_output.vout.to_le_bytes());
        write_varint(buf, script_sig.len() as u64);
        buf.extend_from_slice(script_sig.as_bytes());
        buf.extend_from_slice(&self.sequence.to_le_bytes());
    }
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    /// Value in minor units
    pub value: u64,
    pub script_pubkey: Script,
}

impl TxOut {
    pub fn p2pkh(value: u64, pubkey_hash: &[u8; 20]) -> Self {
        Self {
            value,
            script_pubkey: Script::p2pkh(pubkey_hash),
        }
    }

    fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.value.to_le_bytes());
        write_varint(buf, self.script_pubkey.len() as u64);
        buf.extend_from_slice(self.script_pubkey.as_bytes());
    }
}

/// A complete transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    /// Creation time, seconds since Unix epoch
    pub time: u32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
}

impl Transaction {
    pub fn new(time: u32, inputs: Vec<TxIn>, outputs: Vec<TxOut>) -> Self {
        Self {
            version: TX_VERSION,
            time,
            inputs,
            outputs,
            lock_time: 0,
        }
    }

    fn write(&self, buf: &mut Vec<u8>, script_for: impl Fn(usize, &TxIn) -> Script) {
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&self.time.to_le_bytes());
        write_varint(buf, self.inputs.len() as u64);
        for (i, input) in self.inputs.iter().enumerate() {
            input.write(buf, &script_for(i, input));
        }
        write_varint(buf, self.outputs.len() as u64);
        for output in &self.outputs {
            output.write(buf);
        }
        buf.extend_from_slice(&self.lock_time.to_le_bytes());
    }

    /// Wire serialization
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write(&mut buf, |_, input| input.script_sig.clone());
        buf
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }

    /// Transaction id in display order
    pub fn txid(&self) -> Hash {
        double_sha256(&self.serialize()).reversed()
    }

    /// Legacy SIGHASH_ALL preimage for input `index`: every scriptSig
    /// emptied except `index`, which carries `prev_script`; 4-byte hash
    /// type appended.
    pub fn signature_preimage(&self, index: usize, prev_script: &Script) -> Result<Vec<u8>, TxError> {
        if index >= self.inputs.len() {
            return Err(TxError::InputIndexOutOfRange {
                index,
                inputs: self.inputs.len(),
            });
        }
        let mut buf = Vec::new();
        self.write(&mut buf, |i, _| {
            if i == index {
                prev_script.clone()
            } else {
                Script::empty()
            }
        });
        buf.extend_from_slice(&SIGHASH_ALL.to_le_bytes());
        Ok(buf)
    }

    /// Digest signed for input `index`
    pub fn signature_hash(&self, index: usize, prev_script: &Script) -> Result<Hash, TxError> {
        Ok(double_sha256(&self.signature_preimage(index, prev_script)?))
    }

    /// Sum of output values
    pub fn total_output_value(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, out| acc.checked_add(out.value))
    }

    /// Parse a full transaction; trailing bytes are an error
    pub fn parse(bytes: &[u8]) -> Result<Self, TxError> {
        let mut reader = ByteReader::new(bytes);
        let version = reader.read_u32_le()?;
        let time = reader.read_u32_le()?;

        let input_count = reader.read_length()?;
        let mut inputs = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            let txid = Hash::from_bytes(reader.read_array32()?).reversed();
            let vout = reader.read_u32_le()?;
            let script_sig = Script(reader.read_var_bytes()?.to_vec());
            let sequence = reader.read_u32_le()?;
            inputs.push(TxIn {
                previous_output: OutPoint::new(txid, vout),
                script_sig,
                sequence,
            });
        }

        let output_count = reader.read_length()?;
        let mut outputs = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            let value = reader.read_u64_le()?;
            let script_pubkey = Script(reader.read_var_bytes()?.to_vec());
            outputs.push(TxOut {
                value,
                script_pubkey,
            });
        }

        let lock_time = reader.read_u32_le()?;
        if !reader.is_empty() {
            return Err(TxError::TrailingBytes(reader.remaining()));
        }

        Ok(Transaction {
            version,
            time,
            inputs,
            outputs,
            lock_time,
        })
    }

    pub fn from_hex(raw_hex: &str) -> Result<Self, TxError> {
        let bytes = hex::decode(raw_hex.trim()).map_err(|_| TxError::InvalidHex)?;
        Self::parse(&bytes)
    }
}

/// Output script at `vout` of a raw previous transaction, after checking the
/// raw bytes hash to `expected_txid`
pub fn previous_output_script(
    raw_hex: &str,
    expected_txid: &Hash,
    vout: u32,
) -> Result<(Script, u64), TxError> {
    let bytes = hex::decode(raw_hex.trim()).map_err(|_| TxError::InvalidHex)?;
    let found = double_sha256(&bytes).reversed();
    if found != *expected_txid {
        return Err(TxError::PrevTxMismatch {
            expected: *expected_txid,
            found,
        });
    }
    let tx = Transaction::parse(&bytes)?;
    let output = tx
        .outputs
        .get(vout as usize)
        .ok_or(TxError::OutputIndexOutOfRange {
            vout,
            outputs: tx.outputs.len(),
        })?;
    Ok((output.script_pubkey.clone(), output.value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256;

    fn sample() -> Transaction {
        let inputs = vec![
            TxIn::new(OutPoint::new(sha256(b"one"), 0)),
            TxIn::new(OutPoint::new(sha256(b"two"), 3)),
        ];
        let outputs = vec![TxOut::p2pkh(100_000_000, &[1u8; 20]), TxOut::p2pkh(42, &[2u8; 20])];
        Transaction::new(1_700_000_000, inputs, outputs)
    }

    #[test]
    fn test_serialized_layout() {
        let tx = sample();
        let bytes = tx.serialize();
        // header
        assert_eq!(&bytes[0..4], &1u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &1_700_000_000u32.to_le_bytes());
        assert_eq!(bytes[8], 2);
        // first input txid is written byte-reversed
        assert_eq!(&bytes[9..41], sha256(b"one").reversed().as_bytes());
        let unsigned_input = 32 + 4 + 1 + 4;
        let output = 8 + 1 + 25;
        assert_eq!(bytes.len(), 4 + 4 + 1 + 2 * unsigned_input + 1 + 2 * output + 4);
        assert_eq!(&bytes[bytes.len() - 4..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_parse_inverts_serialize() {
        let mut tx = sample();
        tx.inputs[0].script_sig = Script(vec![0x51; 139]);
        let parsed = Transaction::from_hex(&tx.to_hex()).unwrap();
        assert_eq!(parsed, tx);
        assert_eq!(parsed.txid(), tx.txid());
    }

    #[test]
    fn test_preimage_substitutes_only_signed_input() {
        let tx = sample();
        let prev = Script::p2pkh(&[9u8; 20]);
        let preimage = tx.signature_preimage(1, &prev).unwrap();
        assert_eq!(&preimage[preimage.len() - 4..], &[1, 0, 0, 0]);
        assert_eq!(preimage.len(), tx.serialize().len() + 25 + 4);

        let parsed = Transaction::parse(&preimage[..preimage.len() - 4]).unwrap();
        assert!(parsed.inputs[0].script_sig.is_empty());
        assert_eq!(parsed.inputs[1].script_sig, prev);

        assert_ne!(
            tx.signature_hash(0, &prev).unwrap(),
            tx.signature_hash(1, &prev).unwrap()
        );
    }

    #[test]
    fn test_preimage_index_checked() {
        assert_eq!(
            sample().signature_preimage(2, &Script::empty()),
            Err(TxError::InputIndexOutOfRange { index: 2, inputs: 2 })
        );
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = sample().serialize();
        bytes.push(0);
        assert_eq!(Transaction::parse(&bytes), Err(TxError::TrailingBytes(1)));
    }

    #[test]
    fn test_previous_output_script() {
        let tx = sample();
        let (script, value) = previous_output_script(&tx.to_hex(), &tx.txid(), 1).unwrap();
        assert_eq!(script.p2pkh_hash(), Some([2u8; 20]));
        assert_eq!(value, 42);

        assert!(matches!(
            previous_output_script(&tx.to_hex(), &tx.txid(), 5),
            Err(TxError::OutputIndexOutOfRange { vout: 5, outputs: 2 })
        ));
        assert!(matches!(
            previous_output_script(&tx.to_hex(), &sha256(b"other"), 0),
            Err(TxError::PrevTxMismatch { .. })
        ));
    }
}
