//! Coin amount conversion without floating point

use crate::constants::{COIN, DECIMAL_PLACES};

use super::PayoutError;

/// `"1.5"` → `150_000_000`. At most eight fractional digits; no sign,
/// no exponent.
pub fn parse_coin_amount(input: &str) -> Result<u64, PayoutError> {
    let invalid = || PayoutError::InvalidInput(format!("invalid coin amount {:?}", input));
    let s = input.trim();
    let (whole, frac) = match s.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > DECIMAL_PLACES as usize {
        return Err(PayoutError::InvalidInput(format!(
            "coin amount {:?} has more than {} decimal places",
            input, DECIMAL_PLACES
        )));
    }

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let frac_units: u64 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = DECIMAL_PLACES as usize);
        padded.parse().map_err(|_| invalid())?
    };

    whole
        .checked_mul(COIN)
        .and_then(|units| units.checked_add(frac_units))
        .ok_or_else(invalid)
}

/// `150_000_000` → `"1.50000000"`
pub fn format_coin_amount(units: u64) -> String {
    format!(
        "{}.{:0width$}",
        units / COIN,
        units % COIN,
        width = DECIMAL_PLACES as usize
    )
}
