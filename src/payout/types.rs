//! Payout batches, pipeline states and settlements

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::Hash;
use crate::transaction::Recipient;
use crate::utxo::OutPoint;
use crate::wallet::Address;

use super::{parse_coin_amount, PayoutError};

/// Pipeline stage of one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayoutState {
    Idle,
    ValidatingWallet,
    SelectingUtxos,
    BuildingTx,
    Signing,
    Broadcasting,
    Validating,
    Settled,
    Failed,
}

impl PayoutState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PayoutState::Settled | PayoutState::Failed)
    }
}

impl fmt::Display for PayoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PayoutState::Idle => "idle",
            PayoutState::ValidatingWallet => "validating wallet",
            PayoutState::SelectingUtxos => "selecting UTXOs",
            PayoutState::BuildingTx => "building transaction",
            PayoutState::Signing => "signing",
            PayoutState::Broadcasting => "broadcasting",
            PayoutState::Validating => "validating broadcast",
            PayoutState::Settled => "settled",
            PayoutState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One payout as supplied by the caller, before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub address: String,
    /// Minor units
    pub amount: u64,
}

impl PayoutRequest {
    pub fn new(address: impl Into<String>, amount: u64) -> Self {
        Self {
            address: address.into(),
            amount,
        }
    }

    /// Amount given in coins, e.g. `"0.5"`
    pub fn from_coins(address: impl Into<String>, coins: &str) -> Result<Self, PayoutError> {
        Ok(Self::new(address, parse_coin_amount(coins)?))
    }

    pub fn validate(&self) -> Result<Recipient, PayoutError> {
        let address = Address::parse(&self.address).map_err(|e| {
            PayoutError::InvalidInput(format!("recipient address {:?}: {}", self.address, e))
        })?;
        if self.amount == 0 {
            return Err(PayoutError::InvalidInput(format!(
                "amount for {} must be positive",
                self.address
            )));
        }
        Ok(Recipient::new(address, self.amount))
    }
}

/// Recipients paid together in one transaction
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PayoutBatch {
    pub payouts: Vec<PayoutRequest>,
}

impl PayoutBatch {
    pub fn new(payouts: Vec<PayoutRequest>) -> Self {
        Self { payouts }
    }

    /// Validated recipients and their total
    pub fn recipients(&self) -> Result<(Vec<Recipient>, u64), PayoutError> {
        if self.payouts.is_empty() {
            return Err(PayoutError::InvalidInput("payout batch is empty".into()));
        }
        let mut total = 0u64;
        let mut recipients = Vec::with_capacity(self.payouts.len());
        for payout in &self.payouts {
            let recipient = payout.validate()?;
            total = total
                .checked_add(recipient.amount)
                .ok_or_else(|| PayoutError::InvalidInput("batch total overflows".into()))?;
            recipients.push(recipient);
        }
        Ok((recipients, total))
    }
}

/// What the caller persists once a batch is settled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Display-order txid as returned by the server
    pub txid: Hash,
    /// Sum paid to recipients
    pub total_amount: u64,
    /// Inputs minus outputs
    pub fee: u64,
    pub change_amount: u64,
    pub inputs_used: Vec<OutPoint>,
    pub recipients_paid: usize,
}
