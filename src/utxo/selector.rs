//! Largest-first input selection with a dust-aware variant

use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

use crate::constants::{DUST_THRESHOLD, MAX_INPUTS};

use super::{total_value, OutPoint, Utxo};

/// Selection errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("No UTXOs available")]
    NoUtxos,
    #[error("Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },
    #[error("Input cap of {max_inputs} reached with {selected} selected, need {needed}")]
    InputCapReached {
        needed: u64,
        selected: u64,
        max_inputs: usize,
    },
}

/// Chosen inputs and their total
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub selected: Vec<Utxo>,
    pub total_value: u64,
}

impl Selection {
    pub fn outpoints(&self) -> Vec<OutPoint> {
        self.selected.iter().map(|u| u.outpoint).collect()
    }
}

fn check_available(utxos: &[Utxo], target: u64) -> Result<Vec<Utxo>, SelectionError> {
    if utxos.is_empty() {
        return Err(SelectionError::NoUtxos);
    }
    let available = total_value(utxos).unwrap_or(u64::MAX);
    if available < target {
        return Err(SelectionError::InsufficientFunds {
            needed: target,
            available,
        });
    }
    let mut sorted = utxos.to_vec();
    sorted.sort_by(|a, b| b.value.cmp(&a.value));
    Ok(sorted)
}

/// Single output if one covers `target`, otherwise largest-first accumulation
pub fn select_utxos(utxos: &[Utxo], target: u64) -> Result<Selection, SelectionError> {
    let sorted = check_available(utxos, target)?;

    if let Some(single) = sorted.iter().find(|u| u.value >= target) {
        debug!(outpoint = %single.outpoint, value = single.value, "single UTXO covers target");
        return Ok(Selection {
            selected: vec![single.clone()],
            total_value: single.value,
        });
    }

    let mut selected = Vec::new();
    let mut total = 0u64;
    for utxo in sorted {
        total = total.saturating_add(utxo.value);
        selected.push(utxo);
        if total >= target {
            debug!(inputs = selected.len(), total, "multi-UTXO selection");
            return Ok(Selection {
                selected,
                total_value: total,
            });
        }
    }

    Err(SelectionError::InsufficientFunds {
        needed: target,
        available: total,
    })
}

/// Dust-aware selector used by the multi-recipient payout path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtxoSelector {
    pub dust_threshold: u64,
    pub max_inputs: usize,
}

impl Default for UtxoSelector {
    fn default() -> Self {
        Self {
            dust_threshold: DUST_THRESHOLD,
            max_inputs: MAX_INPUTS,
        }
    }
}

impl UtxoSelector {
    pub fn new(dust_threshold: u64, max_inputs: usize) -> Self {
        Self {
            dust_threshold,
            max_inputs,
        }
    }

    /// Non-dust outputs largest-first; dust only if those fall short.
    /// Never selects more than `max_inputs`.
    pub fn select(&self, utxos: &[Utxo], target: u64) -> Result<Selection, SelectionError> {
        let sorted = check_available(utxos, target)?;
        let non_dust: Vec<&Utxo> = sorted
            .iter()
            .filter(|u| u.value >= self.dust_threshold)
            .collect();
        let has_dust = non_dust.len() != sorted.len();

        let mut selected: Vec<Utxo> = Vec::new();
        let mut chosen: HashSet<OutPoint> = HashSet::new();
        let mut total = 0u64;

        let first_pass: Vec<&Utxo> = if non_dust.is_empty() {
            sorted.iter().collect()
        } else {
            non_dust
        };
        let passes = [first_pass, sorted.iter().collect::<Vec<&Utxo>>()];

        for (pass, candidates) in passes.iter().enumerate() {
            if pass == 1 && !has_dust {
                break;
            }
            for utxo in candidates {
                if chosen.contains(&utxo.outpoint) {
                    continue;
                }
                if selected.len() >= self.max_inputs {
                    break;
                }
                chosen.insert(utxo.outpoint);
                total = total.saturating_add(utxo.value);
                selected.push((*utxo).clone());
                if total >= target {
                    debug!(
                        inputs = selected.len(),
                        total,
                        used_dust = pass == 1,
                        "dust-aware selection complete"
                    );
                    return Ok(Selection {
                        selected,
                        total_value: total,
                    });
                }
            }
        }

        if selected.len() >= self.max_inputs {
            return Err(SelectionError::InputCapReached {
                needed: target,
                selected: total,
                max_inputs: self.max_inputs,
            });
        }
        Err(SelectionError::InsufficientFunds {
            needed: target,
            available: total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256;

    fn utxo(tag: &str, value: u64) -> Utxo {
        Utxo::new(sha256(tag.as_bytes()), 0, value)
    }

    #[test]
    fn test_single_utxo_preferred() {
        let utxos = vec![utxo("a", 100), utxo("b", 5_000), utxo("c", 900)];
        let selection = select_utxos(&utxos, 800).unwrap();
        assert_eq!(selection.selected.len(), 1);
        assert_eq!(selection.total_value, 5_000);
    }

    #[test]
    fn test_greedy_accumulation() {
        let utxos = vec![utxo("a", 300), utxo("b", 500), utxo("c", 400)];
        let selection = select_utxos(&utxos, 800).unwrap();
        assert_eq!(selection.selected.len(), 2);
        assert_eq!(selection.total_value, 900);
    }

    #[test]
    fn test_insufficient_funds_reports_totals() {
        let utxos = vec![utxo("a", 300), utxo("b", 500)];
        assert_eq!(
            select_utxos(&utxos, 801),
            Err(SelectionError::InsufficientFunds {
                needed: 801,
                available: 800
            })
        );
    }

    #[test]
    fn test_empty_set() {
        assert_eq!(select_utxos(&[], 1), Err(SelectionError::NoUtxos));
        assert_eq!(
            UtxoSelector::default().select(&[], 1),
            Err(SelectionError::NoUtxos)
        );
    }

    #[test]
    fn test_dust_skipped_when_possible() {
        let utxos = vec![
            utxo("dust1", 10_000),
            utxo("dust2", 20_000),
            utxo("big", 15_000_000),
        ];
        let selection = UtxoSelector::default().select(&utxos, 14_000_000).unwrap();
        assert_eq!(selection.selected.len(), 1);
        assert_eq!(selection.selected[0].value, 15_000_000);
    }

    #[test]
    fn test_dust_used_as_fallback() {
        let utxos = vec![
            utxo("dust1", 300_000),
            utxo("dust2", 200_000),
            utxo("big", 1_000_000),
        ];
        let selection = UtxoSelector::default().select(&utxos, 1_250_000).unwrap();
        assert_eq!(selection.selected.len(), 2);
        assert_eq!(selection.total_value, 1_300_000);
    }

    #[test]
    fn test_all_dust_wallet() {
        let utxos = vec![utxo("a", 1_000), utxo("b", 2_000), utxo("c", 3_000)];
        let selection = UtxoSelector::default().select(&utxos, 4_500).unwrap();
        assert_eq!(selection.total_value, 5_000);
    }

    #[test]
    fn test_input_cap() {
        let utxos: Vec<Utxo> = (0..10).map(|i| utxo(&format!("u{}", i), 100)).collect();
        let selector = UtxoSelector::new(DUST_THRESHOLD, 3);
        assert_eq!(
            selector.select(&utxos, 500),
            Err(SelectionError::InputCapReached {
                needed: 500,
                selected: 300,
                max_inputs: 3
            })
        );
    }
}
