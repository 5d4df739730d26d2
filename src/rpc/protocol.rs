//! Electrum wire types
//!
//! One JSON object per line in each direction:
//! `{"id", "method", "params"}` out, `{"id", "result" | "error"}` back.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::crypto::Hash;
use crate::utxo::Utxo;

use super::RpcError;

pub const METHOD_GET_BALANCE: &str = "blockchain.address.get_balance";
pub const METHOD_LIST_UNSPENT: &str = "blockchain.address.listunspent";
pub const METHOD_GET_TRANSACTION: &str = "blockchain.transaction.get";
pub const METHOD_BROADCAST: &str = "blockchain.transaction.broadcast";

/// Outgoing request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectrumRequest {
    pub id: u64,
    pub method: String,
    pub params: Vec<Value>,
}

impl ElectrumRequest {
    /// Newline-terminated JSON line
    pub fn to_line(&self) -> Result<String, RpcError> {
        let mut line = serde_json::to_string(self)
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;
        line.push('\n');
        Ok(line)
    }
}

/// Incoming response
#[derive(Debug, Clone, Deserialize)]
pub struct ElectrumResponse {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

/// Error payload reported by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    pub code: Option<i64>,
    pub message: String,
}

impl ServerError {
    /// Servers send either `{"code", "message"}` or a bare string
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => ServerError {
                code: map.get("code").and_then(Value::as_i64),
                message: map
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string()),
            },
            Value::String(s) => ServerError {
                code: None,
                message: s.clone(),
            },
            other => ServerError {
                code: None,
                message: other.to_string(),
            },
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code {})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

/// `blockchain.address.get_balance` result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBalance {
    pub confirmed: u64,
    /// Negative while spends of confirmed outputs sit in the mempool
    pub unconfirmed: i64,
}

/// One `blockchain.address.listunspent` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentEntry {
    pub tx_hash: String,
    pub tx_pos: u32,
    #[serde(default)]
    pub height: i64,
    pub value: u64,
}

impl UnspentEntry {
    /// Sanity-check and convert; the hash must be 64 hex chars and the value positive
    pub fn into_utxo(self) -> Result<Utxo, RpcError> {
        let txid = Hash::from_hex(&self.tx_hash)
            .map_err(|_| RpcError::InvalidResponse(format!("malformed UTXO hash {:?}", self.tx_hash)))?;
        if self.value == 0 {
            return Err(RpcError::InvalidResponse(format!(
                "zero-value UTXO {}:{}",
                self.tx_hash, self.tx_pos
            )));
        }
        let mut utxo = Utxo::new(txid, self.tx_pos, self.value);
        utxo.height = u64::try_from(self.height).unwrap_or(0);
        Ok(utxo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_line() {
        let request = ElectrumRequest {
            id: 7,
            method: METHOD_LIST_UNSPENT.to_string(),
            params: vec![json!("LaddR")],
        };
        let line = request.to_line().unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
        let parsed: Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(parsed["method"], "blockchain.address.listunspent");
        assert_eq!(parsed["params"][0], "LaddR");
    }

    #[test]
    fn test_server_error_shapes() {
        let structured = ServerError::from_value(&json!({"code": -26, "message": "dust"}));
        assert_eq!(structured.code, Some(-26));
        assert_eq!(structured.message, "dust");

        let bare = ServerError::from_value(&json!("bad request"));
        assert_eq!(bare.code, None);
        assert_eq!(bare.message, "bad request");
    }

    #[test]
    fn test_unspent_entry_conversion() {
        let entry: UnspentEntry = serde_json::from_value(json!({
            "tx_hash": "ab".repeat(32),
            "tx_pos": 2,
            "height": 812345,
            "value": 15_000_000u64
        }))
        .unwrap();
        let utxo = entry.into_utxo().unwrap();
        assert_eq!(utxo.outpoint.vout, 2);
        assert_eq!(utxo.value, 15_000_000);
        assert_eq!(utxo.height, 812345);
        assert_eq!(utxo.outpoint.txid.to_hex(), "ab".repeat(32));
    }

    #[test]
    fn test_unspent_entry_rejects_malformed() {
        let short = UnspentEntry {
            tx_hash: "abcd".into(),
            tx_pos: 0,
            height: 0,
            value: 1,
        };
        assert!(short.into_utxo().is_err());

        let zero = UnspentEntry {
            tx_hash: "00".repeat(32),
            tx_pos: 0,
            height: 0,
            value: 0,
        };
        assert!(zero.into_utxo().is_err());
    }
}
