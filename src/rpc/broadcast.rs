//! Classification of `blockchain.transaction.broadcast` results
//!
//! A plain-string result is only accepted when it carries none of the
//! rejection markers AND is exactly one 64-hex-character txid.

use crate::crypto::Hash;

use super::ServerError;

/// Substrings that mark a string result as a rejection
pub const REJECTION_MARKERS: &[&str] = &[
    "TX rejected",
    "error",
    "Error",
    "failed",
    "Failed",
    "code",
    "-22",
    "-25",
    "-26",
    "-27",
];

const NUMERIC_CODES: &[(&str, i64)] = &[("-22", -22), ("-25", -25), ("-26", -26), ("-27", -27)];

/// What a broadcast returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// Server accepted; txid in display order
    Accepted(Hash),
    /// Server refused the transaction
    Rejected { code: Option<i64>, message: String },
    /// Neither a recognizable rejection nor a txid
    Malformed(String),
}

impl BroadcastOutcome {
    pub fn txid(&self) -> Option<&Hash> {
        match self {
            BroadcastOutcome::Accepted(txid) => Some(txid),
            _ => None,
        }
    }
}

impl From<ServerError> for BroadcastOutcome {
    fn from(error: ServerError) -> Self {
        BroadcastOutcome::Rejected {
            code: error.code,
            message: error.message,
        }
    }
}

/// `^[a-fA-F0-9]{64}$`
pub fn is_txid_hex(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Marker scan first, txid shape second
pub fn classify_broadcast_result(raw: &str) -> BroadcastOutcome {
    if let Some(marker) = REJECTION_MARKERS.iter().find(|m| raw.contains(**m)) {
        let code = NUMERIC_CODES
            .iter()
            .find(|(text, _)| raw.contains(*text))
            .map(|(_, code)| *code);
        tracing::debug!(marker, "broadcast result carries rejection marker");
        return BroadcastOutcome::Rejected {
            code,
            message: raw.to_string(),
        };
    }

    let candidate = raw.trim();
    if is_txid_hex(candidate) {
        if let Ok(txid) = Hash::from_hex(candidate) {
            return BroadcastOutcome::Accepted(txid);
        }
    }
    BroadcastOutcome::Malformed(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TXID: &str = "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

    #[test]
    fn test_accepts_txid() {
        let outcome = classify_broadcast_result(TXID);
        assert_eq!(outcome.txid().map(|h| h.to_hex()), Some(TXID.to_string()));
        assert!(matches!(
            classify_broadcast_result(&TXID.to_uppercase()),
            BroadcastOutcome::Accepted(_)
        ));
    }

    #[test]
    fn test_rejection_wins_over_embedded_txid() {
        let raw = format!("TX rejected: {} already in block chain", TXID);
        assert!(matches!(
            classify_broadcast_result(&raw),
            BroadcastOutcome::Rejected { code: None, .. }
        ));
    }

    #[test]
    fn test_numeric_code_extracted() {
        let raw = "the transaction was rejected by network rules.\n\n-26: dust";
        assert_eq!(
            classify_broadcast_result(raw),
            BroadcastOutcome::Rejected {
                code: Some(-26),
                message: raw.to_string()
            }
        );
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            classify_broadcast_result("ok"),
            BroadcastOutcome::Malformed(_)
        ));
        assert!(matches!(
            classify_broadcast_result(&TXID[..63]),
            BroadcastOutcome::Malformed(_)
        ));
        assert!(matches!(
            classify_broadcast_result(&format!("{}00", TXID)),
            BroadcastOutcome::Malformed(_)
        ));
    }

    #[test]
    fn test_server_error_maps_to_rejection() {
        let outcome: BroadcastOutcome = ServerError {
            code: Some(-25),
            message: "missing inputs".into(),
        }
        .into();
        assert_eq!(
            outcome,
            BroadcastOutcome::Rejected {
                code: Some(-25),
                message: "missing inputs".into()
            }
        );
    }
}
