//! Payout failure taxonomy

use thiserror::Error;

use crate::crypto::SignerError;
use crate::rpc::RpcError;
use crate::transaction::TxError;
use crate::utxo::SelectionError;
use crate::wallet::KeyError;

use super::PayoutState;

/// Why a payout batch failed. Nothing here is retried inside one run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayoutError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },
    #[error("Funding key could not be decoded: {0}")]
    KeyDecode(#[from] KeyError),
    #[error("RPC error: {0}")]
    Rpc(RpcError),
    #[error("No Electrum server reachable after {attempts} attempts")]
    NoServerAvailable { attempts: usize },
    #[error("Invalid broadcast response: {0}")]
    InvalidBroadcastResponse(String),
    #[error("Broadcast rejected{}: {message}", .code.map(|c| format!(" (code {})", c)).unwrap_or_default())]
    BroadcastRejected { code: Option<i64>, message: String },
    #[error("Signing failed: {0}")]
    Signing(#[from] SignerError),
    #[error("Wallet {0} already has a payout in flight")]
    WalletBusy(String),
    #[error("Payout deadline of {timeout_ms} ms exceeded")]
    DeadlineExceeded { timeout_ms: u64 },
}

impl From<RpcError> for PayoutError {
    fn from(error: RpcError) -> Self {
        match error {
            RpcError::NoServerAvailable { attempts } => PayoutError::NoServerAvailable { attempts },
            other => PayoutError::Rpc(other),
        }
    }
}

impl From<SelectionError> for PayoutError {
    fn from(error: SelectionError) -> Self {
        match error {
            SelectionError::NoUtxos => PayoutError::InsufficientFunds {
                needed: 0,
                available: 0,
            },
            SelectionError::InsufficientFunds { needed, available } => {
                PayoutError::InsufficientFunds { needed, available }
            }
            SelectionError::InputCapReached {
                needed, selected, ..
            } => PayoutError::InsufficientFunds {
                needed,
                available: selected,
            },
        }
    }
}

impl From<TxError> for PayoutError {
    fn from(error: TxError) -> Self {
        match error {
            TxError::InsufficientFunds { needed, available } => {
                PayoutError::InsufficientFunds { needed, available }
            }
            TxError::Selection(e) => e.into(),
            TxError::Signing(e) => PayoutError::Signing(e),
            other => PayoutError::InvalidInput(other.to_string()),
        }
    }
}

/// Terminal failure of one run, with the stage it stopped in
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Payout failed while {stage}: {error}")]
pub struct PayoutFailure {
    pub stage: PayoutState,
    #[source]
    pub error: PayoutError,
}
