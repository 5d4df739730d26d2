//! Line-delimited JSON-RPC over TCP with server failover
//!
//! Every call opens a fresh connection, writes one request line, reads one
//! response line and closes. Connecting walks the candidate list in order,
//! pausing between full rounds; the request/response exchange itself runs
//! under a per-call timeout and is not retried.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::crypto::Hash;
use crate::utxo::Utxo;
use crate::wallet::Address;

use super::{
    classify_broadcast_result, AddressBalance, BroadcastOutcome, ElectrumRequest,
    ElectrumResponse, ServerEndpoint, ServerError, UnspentEntry, METHOD_BROADCAST,
    METHOD_GET_BALANCE, METHOD_GET_TRANSACTION, METHOD_LIST_UNSPENT,
};

/// Upper bound on a single response line
pub const MAX_RESPONSE_BYTES: u64 = 16 * 1024 * 1024;

/// RPC errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    #[error("No Electrum server reachable after {attempts} connection attempts")]
    NoServerAvailable { attempts: usize },
    #[error("{method} timed out after {timeout_ms} ms")]
    Timeout { method: String, timeout_ms: u64 },
    #[error("Connection error: {0}")]
    Io(String),
    #[error("Server error: {0}")]
    Server(String, Option<i64>),
    #[error("Empty response from server")]
    EmptyResponse,
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Invalid server endpoint: {0}")]
    InvalidEndpoint(String),
}

impl From<ServerError> for RpcError {
    fn from(error: ServerError) -> Self {
        RpcError::Server(error.message, error.code)
    }
}

/// Operations the payout pipeline needs from an Electrum server
#[async_trait]
pub trait ElectrumApi: Send + Sync {
    async fn get_balance(&self, address: &Address) -> Result<AddressBalance, RpcError>;

    async fn list_unspent(&self, address: &Address) -> Result<Vec<Utxo>, RpcError>;

    /// Raw transaction hex for a display-order txid
    async fn get_transaction(&self, txid: &Hash) -> Result<String, RpcError>;

    async fn broadcast(&self, raw_hex: &str) -> Result<BroadcastOutcome, RpcError>;
}

/// Timeouts and retry policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub connect_timeout: Duration,
    pub call_timeout: Duration,
    pub broadcast_timeout: Duration,
    /// Full passes over the server list before giving up
    pub max_rounds: usize,
    /// Pause between passes
    pub retry_backoff: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            call_timeout: Duration::from_secs(30),
            broadcast_timeout: Duration::from_secs(45),
            max_rounds: 3,
            retry_backoff: Duration::from_secs(1),
        }
    }
}

/// Electrum client over an ordered server list
#[derive(Debug)]
pub struct ElectrumClient {
    servers: Vec<ServerEndpoint>,
    options: ClientOptions,
    next_id: AtomicU64,
}

impl ElectrumClient {
    pub fn new(servers: Vec<ServerEndpoint>, options: ClientOptions) -> Self {
        Self {
            servers,
            options,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn servers(&self) -> &[ServerEndpoint] {
        &self.servers
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// First server that accepts a connection, in order, over bounded rounds
    async fn connect(&self) -> Result<(TcpStream, &ServerEndpoint), RpcError> {
        let mut attempts = 0;
        for round in 1..=self.options.max_rounds {
            for server in &self.servers {
                attempts += 1;
                debug!(server = %server, round, "connecting");
                let result = timeout(
                    self.options.connect_timeout,
                    TcpStream::connect((server.host.as_str(), server.port)),
                )
                .await;
                match result {
                    Ok(Ok(stream)) => {
                        debug!(server = %server, "connected");
                        return Ok((stream, server));
                    }
                    Ok(Err(e)) => warn!(server = %server, round, error = %e, "connect failed"),
                    Err(_) => warn!(server = %server, round, "connect timed out"),
                }
            }
            if round < self.options.max_rounds {
                sleep(self.options.retry_backoff).await;
            }
        }
        Err(RpcError::NoServerAvailable { attempts })
    }

    async fn exchange(stream: TcpStream, request: &ElectrumRequest) -> Result<Value, RpcError> {
        let (reader, mut writer) = stream.into_split();
        let line = request.to_line()?;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| RpcError::Io(e.to_string()))?;
        writer.flush().await.map_err(|e| RpcError::Io(e.to_string()))?;

        // Up to newline or close
        let mut reader = BufReader::new(reader.take(MAX_RESPONSE_BYTES));
        let mut buf = Vec::new();
        reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| RpcError::Io(e.to_string()))?;

        let text = String::from_utf8_lossy(&buf);
        let text = text.trim();
        if text.is_empty() {
            return Err(RpcError::EmptyResponse);
        }

        let response: ElectrumResponse = serde_json::from_str(text)
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;
        if let Some(id) = response.id.as_ref().and_then(Value::as_u64) {
            if id != request.id {
                return Err(RpcError::InvalidResponse(format!(
                    "response id {} does not match request id {}",
                    id, request.id
                )));
            }
        }
        if let Some(error) = response.error.filter(|e| !e.is_null()) {
            return Err(ServerError::from_value(&error).into());
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    /// One request on a fresh connection, bounded by `call_timeout`
    pub async fn call_with_timeout(
        &self,
        method: &str,
        params: Vec<Value>,
        call_timeout: Duration,
    ) -> Result<Value, RpcError> {
        let (stream, server) = self.connect().await?;
        let request = ElectrumRequest {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method: method.to_string(),
            params,
        };

        match timeout(call_timeout, Self::exchange(stream, &request)).await {
            Ok(result) => {
                if let Err(e) = &result {
                    warn!(server = %server, method, error = %e, "call failed");
                }
                result
            }
            Err(_) => {
                warn!(server = %server, method, "call timed out");
                Err(RpcError::Timeout {
                    method: method.to_string(),
                    timeout_ms: call_timeout.as_millis() as u64,
                })
            }
        }
    }

    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        self.call_with_timeout(method, params, self.options.call_timeout)
            .await
    }
}

fn decode<T: serde::de::DeserializeOwned>(method: &str, value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value).map_err(|e| RpcError::InvalidResponse(format!("{}: {}", method, e)))
}

#[async_trait]
impl ElectrumApi for ElectrumClient {
    async fn get_balance(&self, address: &Address) -> Result<AddressBalance, RpcError> {
        let value = self
            .call(METHOD_GET_BALANCE, vec![json!(address.to_string())])
            .await?;
        decode(METHOD_GET_BALANCE, value)
    }

    async fn list_unspent(&self, address: &Address) -> Result<Vec<Utxo>, RpcError> {
        let value = self
            .call(METHOD_LIST_UNSPENT, vec![json!(address.to_string())])
            .await?;
        let entries: Vec<UnspentEntry> = decode(METHOD_LIST_UNSPENT, value)?;
        entries.into_iter().map(UnspentEntry::into_utxo).collect()
    }

    async fn get_transaction(&self, txid: &Hash) -> Result<String, RpcError> {
        let value = self
            .call(METHOD_GET_TRANSACTION, vec![json!(txid.to_hex())])
            .await?;
        match value {
            Value::String(raw) => Ok(raw),
            other => Err(RpcError::InvalidResponse(format!(
                "{}: expected hex string, got {}",
                METHOD_GET_TRANSACTION, other
            ))),
        }
    }

    async fn broadcast(&self, raw_hex: &str) -> Result<BroadcastOutcome, RpcError> {
        let result = self
            .call_with_timeout(
                METHOD_BROADCAST,
                vec![json!(raw_hex)],
                self.options.broadcast_timeout,
            )
            .await;
        let outcome = match result {
            Ok(Value::String(raw)) => classify_broadcast_result(&raw),
            Ok(Value::Null) => BroadcastOutcome::Malformed("empty result".to_string()),
            Ok(other) => classify_broadcast_result(&other.to_string()),
            Err(RpcError::Server(message, code)) => BroadcastOutcome::Rejected { code, message },
            Err(e) => return Err(e),
        };
        info!(?outcome, "broadcast result");
        Ok(outcome)
    }
}
