//! Assembles and signs a multi-input, multi-output payout transaction

use tracing::{debug, info};

use crate::constants::{MIN_CHANGE, SIGHASH_ALL};
use crate::crypto::{Hash, NonceStrategy, SignatureScheme};
use crate::utxo::OutPoint;
use crate::wallet::{Address, KeyMaterial};

use super::{Script, Transaction, TxError, TxIn, TxOut};

/// One payout destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub address: Address,
    /// Amount in minor units
    pub amount: u64,
}

impl Recipient {
    pub fn new(address: Address, amount: u64) -> Self {
        Self { address, amount }
    }
}

/// An output being spent, with the script its signature must commit to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendableOutput {
    pub outpoint: OutPoint,
    pub value: u64,
    pub script_pubkey: Script,
}

/// Signed transaction plus the accounting the caller persists
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub txid: Hash,
    pub raw_hex: String,
    /// Inputs minus outputs, including any absorbed change
    pub fee: u64,
    pub change_amount: u64,
    pub inputs_used: Vec<OutPoint>,
}

/// Builds legacy P2PKH transactions for one funding key
pub struct TransactionBuilder<'a> {
    key: &'a KeyMaterial,
    scheme: SignatureScheme,
    time: u32,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(key: &'a KeyMaterial, time: u32) -> Self {
        Self {
            key,
            scheme: SignatureScheme::Ecdsa(NonceStrategy::default()),
            time,
        }
    }

    pub fn with_nonce_strategy(mut self, strategy: NonceStrategy) -> Self {
        self.scheme = SignatureScheme::Ecdsa(strategy);
        self
    }

    /// Recipient outputs first, then change to `change_address` if it
    /// exceeds the minimum. Returns the outputs and the change paid.
    pub fn build_outputs(
        recipients: &[Recipient],
        total_in: u64,
        fee: u64,
        change_address: &Address,
    ) -> Result<(Vec<TxOut>, u64), TxError> {
        if recipients.is_empty() {
            return Err(TxError::NoRecipients);
        }
        let mut total_out = 0u64;
        let mut outputs = Vec::with_capacity(recipients.len() + 1);
        for recipient in recipients {
            if recipient.amount == 0 {
                return Err(TxError::ZeroAmount);
            }
            total_out = total_out
                .checked_add(recipient.amount)
                .ok_or(TxError::AmountOverflow)?;
            outputs.push(TxOut::p2pkh(recipient.amount, recipient.address.pubkey_hash()));
        }

        let needed = total_out.checked_add(fee).ok_or(TxError::AmountOverflow)?;
        let change = total_in
            .checked_sub(needed)
            .ok_or(TxError::InsufficientFunds {
                needed,
                available: total_in,
            })?;

        if change > MIN_CHANGE {
            outputs.push(TxOut::p2pkh(change, change_address.pubkey_hash()));
            Ok((outputs, change))
        } else {
            debug!(change, "change below minimum, absorbed into fee");
            Ok((outputs, 0))
        }
    }

    /// Build, sign every input, and serialize
    pub fn build(
        &self,
        inputs: &[SpendableOutput],
        recipients: &[Recipient],
        fee: u64,
    ) -> Result<SignedTransaction, TxError> {
        if fee == 0 {
            return Err(TxError::ZeroAmount);
        }
        if inputs.is_empty() {
            return Err(TxError::InsufficientFunds {
                needed: fee,
                available: 0,
            });
        }

        let own_hash = self.key.address().pubkey_hash();
        let mut total_in = 0u64;
        for input in inputs {
            match input.script_pubkey.p2pkh_hash() {
                None => return Err(TxError::NotP2pkh(input.outpoint)),
                Some(hash) if &hash != own_hash => {
                    return Err(TxError::ForeignOutput(input.outpoint))
                }
                Some(_) => {}
            }
            total_in = total_in
                .checked_add(input.value)
                .ok_or(TxError::AmountOverflow)?;
        }

        let (outputs, change_amount) =
            Self::build_outputs(recipients, total_in, fee, self.key.address())?;
        let tx_inputs = inputs.iter().map(|i| TxIn::new(i.outpoint)).collect();
        let mut tx = Transaction::new(self.time, tx_inputs, outputs);

        // Every digest is taken over the unsigned skeleton
        let mut script_sigs = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.iter().enumerate() {
            let digest = tx.signature_hash(index, &input.script_pubkey)?;
            let signature = self.scheme.sign(digest.as_bytes(), self.key.secret())?;
            let mut sig_bytes = signature.to_bytes();
            sig_bytes.push(SIGHASH_ALL as u8);
            script_sigs.push(Script::p2pkh_spend(&sig_bytes, self.key.public_key()));
        }
        for (input, script_sig) in tx.inputs.iter_mut().zip(script_sigs) {
            input.script_sig = script_sig;
        }

        let total_out = tx.total_output_value().ok_or(TxError::AmountOverflow)?;
        let actual_fee = total_in - total_out;
        let txid = tx.txid();
        let raw_hex = tx.to_hex();

        info!(
            txid = %txid,
            inputs = inputs.len(),
            outputs = tx.outputs.len(),
            fee = actual_fee,
            change = change_amount,
            size = raw_hex.len() / 2,
            "transaction signed"
        );

        Ok(SignedTransaction {
            inputs_used: inputs.iter().map(|i| i.outpoint).collect(),
            transaction: tx,
            txid,
            raw_hex,
            fee: actual_fee,
            change_amount,
        })
    }
}
