//! Fixed-rate fee heuristic and fee-aware input selection

use tracing::debug;

use crate::constants::{
    FEE_BYTES_OVERHEAD, FEE_BYTES_PER_INPUT, FEE_BYTES_PER_OUTPUT, FEE_MAX_ITERATIONS,
    FEE_RATE_PER_BYTE, FEE_SAFETY_MULTIPLIER,
};
use crate::utxo::{Selection, Utxo, UtxoSelector};

use super::TxError;

/// `(inputs × 180 + outputs × 34 + 10) × 100 × 1.5`, rounded down
pub fn estimate_fee(inputs: usize, outputs: usize) -> u64 {
    let bytes = (inputs as u64)
        .saturating_mul(FEE_BYTES_PER_INPUT)
        .saturating_add((outputs as u64).saturating_mul(FEE_BYTES_PER_OUTPUT))
        .saturating_add(FEE_BYTES_OVERHEAD);
    let (num, den) = FEE_SAFETY_MULTIPLIER;
    bytes
        .saturating_mul(FEE_RATE_PER_BYTE)
        .saturating_mul(num)
        / den
}

/// Inputs chosen together with the fee they imply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundedSelection {
    pub selection: Selection,
    pub fee: u64,
}

/// Select inputs for `amount` plus a fee for `recipient_count` outputs and
/// a change output, re-selecting while the fee outgrows the selection.
pub fn select_with_fee(
    selector: &UtxoSelector,
    utxos: &[Utxo],
    amount: u64,
    recipient_count: usize,
) -> Result<FundedSelection, TxError> {
    let outputs = recipient_count + 1;
    let mut selection = selector.select(utxos, amount)?;
    let mut fee = estimate_fee(selection.selected.len(), outputs);
    let mut needed = amount.checked_add(fee).ok_or(TxError::AmountOverflow)?;

    let mut iterations = 0;
    while selection.total_value < needed && iterations < FEE_MAX_ITERATIONS {
        iterations += 1;
        selection = selector.select(utxos, needed)?;
        fee = estimate_fee(selection.selected.len(), outputs);
        needed = amount.checked_add(fee).ok_or(TxError::AmountOverflow)?;
        debug!(iterations, inputs = selection.selected.len(), fee, "fee re-selection");
    }

    if selection.total_value < needed {
        return Err(TxError::InsufficientFunds {
            needed,
            available: selection.total_value,
        });
    }

    Ok(FundedSelection { selection, fee })
}
