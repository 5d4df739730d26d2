//! Electrum server endpoints
//!
//! The configured primary is always tried first; the coin's public
//! servers follow in a fixed order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{ELECTRUM_PORT, FALLBACK_ELECTRUM_SERVERS};

use super::RpcError;

/// `host:port` of an Electrum server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
}

impl ServerEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Accepts `host` (default port) or `host:port`. IPv6 hosts are
/// bracketed: `[::1]` or `[::1]:5097`.
impl FromStr for ServerEndpoint {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || RpcError::InvalidEndpoint(s.to_string());
        let parse_port = |port: &str| port.parse::<u16>().map_err(|_| invalid());

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
            match tail {
                "" => (host, ELECTRUM_PORT),
                _ => (host, parse_port(tail.strip_prefix(':').ok_or_else(invalid)?)?),
            }
        } else {
            match s.rsplit_once(':') {
                // unbracketed IPv6 is ambiguous
                Some((host, _)) if host.contains(':') => return Err(invalid()),
                Some((host, port)) => (host, parse_port(port)?),
                None => (s, ELECTRUM_PORT),
            }
        };
        if host.is_empty() || port == 0 {
            return Err(RpcError::InvalidEndpoint(s.to_string()));
        }
        Ok(ServerEndpoint::new(host, port))
    }
}

impl TryFrom<String> for ServerEndpoint {
    type Error = RpcError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServerEndpoint> for String {
    fn from(endpoint: ServerEndpoint) -> Self {
        endpoint.to_string()
    }
}

/// The coin's public Electrum servers
pub fn default_fallback_servers() -> Vec<ServerEndpoint> {
    FALLBACK_ELECTRUM_SERVERS
        .iter()
        .map(|(host, port)| ServerEndpoint::new(*host, *port))
        .collect()
}

/// Primary first, then fallbacks, without duplicates
pub fn candidate_servers(primary: &ServerEndpoint, fallbacks: &[ServerEndpoint]) -> Vec<ServerEndpoint> {
    let mut servers = vec![primary.clone()];
    for server in fallbacks {
        if !servers.contains(server) {
            servers.push(server.clone());
        }
    }
    servers
}
