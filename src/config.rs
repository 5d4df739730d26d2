//! Runtime configuration
//!
//! Operational settings (servers, timeouts, retries) come from a TOML file.
//! Coin constants stay in [`crate::constants`]. The funding WIF is a secret
//! and is only ever read from the environment.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::constants::ELECTRUM_PORT;
use crate::relay::check_url;
use crate::rpc::{candidate_servers, default_fallback_servers, ClientOptions, ServerEndpoint};
use crate::wallet::Address;

/// Environment variable holding the funding wallet's WIF
pub const FUNDING_WIF_ENV: &str = "LANA_FUNDING_WIF";

const DEFAULT_PRIMARY_HOST: &str = "electrum1.lanacoin.com";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error("Environment variable {0} is not set")]
    MissingSecret(&'static str),
}

fn default_host() -> String {
    DEFAULT_PRIMARY_HOST.to_string()
}

fn default_port() -> u16 {
    ELECTRUM_PORT
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_call_timeout_ms() -> u64 {
    30_000
}

fn default_broadcast_timeout_ms() -> u64 {
    45_000
}

fn default_max_connect_rounds() -> usize {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1_000
}

fn default_relay_timeout_ms() -> u64 {
    10_000
}

/// Payout engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutConfig {
    /// Address the funding WIF must derive to
    pub funding_address: String,
    /// Primary Electrum host, tried first
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_fallback_servers")]
    pub fallback_servers: Vec<ServerEndpoint>,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    #[serde(default = "default_broadcast_timeout_ms")]
    pub broadcast_timeout_ms: u64,
    #[serde(default = "default_max_connect_rounds")]
    pub max_connect_rounds: usize,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Social relays for profile publication
    #[serde(default)]
    pub relays: Vec<String>,
    #[serde(default = "default_relay_timeout_ms")]
    pub relay_timeout_ms: u64,
}

impl PayoutConfig {
    /// Defaults for everything but the funding address
    pub fn new(funding_address: impl Into<String>) -> Self {
        Self {
            funding_address: funding_address.into(),
            host: default_host(),
            port: default_port(),
            fallback_servers: default_fallback_servers(),
            connect_timeout_ms: default_connect_timeout_ms(),
            call_timeout_ms: default_call_timeout_ms(),
            broadcast_timeout_ms: default_broadcast_timeout_ms(),
            max_connect_rounds: default_max_connect_rounds(),
            retry_backoff_ms: default_retry_backoff_ms(),
            relays: Vec::new(),
            relay_timeout_ms: default_relay_timeout_ms(),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: PayoutConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.funding_address.trim().is_empty() {
            return Err(ConfigError::Invalid("funding_address is empty".into()));
        }
        Address::parse(&self.funding_address)
            .map_err(|e| ConfigError::Invalid(format!("funding_address: {}", e)))?;
        if self.host.trim().is_empty() || self.port == 0 {
            return Err(ConfigError::Invalid("primary Electrum server is empty".into()));
        }
        let timeouts = [
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("call_timeout_ms", self.call_timeout_ms),
            ("broadcast_timeout_ms", self.broadcast_timeout_ms),
            ("relay_timeout_ms", self.relay_timeout_ms),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, ms)| *ms == 0) {
            return Err(ConfigError::Invalid(format!("{} must be positive", name)));
        }
        if self.max_connect_rounds == 0 {
            return Err(ConfigError::Invalid("max_connect_rounds must be at least 1".into()));
        }
        for url in &self.relays {
            check_url(url).map_err(|e| ConfigError::Invalid(format!("relays: {}", e)))?;
        }
        Ok(())
    }

    pub fn funding_address(&self) -> Result<Address, ConfigError> {
        Address::parse(&self.funding_address)
            .map_err(|e| ConfigError::Invalid(format!("funding_address: {}", e)))
    }

    pub fn primary_server(&self) -> ServerEndpoint {
        ServerEndpoint::new(self.host.trim(), self.port)
    }

    /// Connection order: primary, then fallbacks
    pub fn servers(&self) -> Vec<ServerEndpoint> {
        candidate_servers(&self.primary_server(), &self.fallback_servers)
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            call_timeout: Duration::from_millis(self.call_timeout_ms),
            broadcast_timeout: Duration::from_millis(self.broadcast_timeout_ms),
            max_rounds: self.max_connect_rounds,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn relay_timeout(&self) -> Duration {
        Duration::from_millis(self.relay_timeout_ms)
    }

    /// Funding WIF from `LANA_FUNDING_WIF`
    pub fn funding_wif_from_env() -> Result<Zeroizing<String>, ConfigError> {
        std::env::var(FUNDING_WIF_ENV)
            .map(Zeroizing::new)
            .map_err(|_| ConfigError::MissingSecret(FUNDING_WIF_ENV))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn address() -> String {
        Address::from_pubkey_hash([3u8; 20]).to_string()
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = PayoutConfig::from_toml_str(&format!("funding_address = \"{}\"", address())).unwrap();
        assert_eq!(config, PayoutConfig::new(address()));
        assert_eq!(config.call_timeout_ms, 30_000);
        assert_eq!(config.broadcast_timeout_ms, 45_000);
        assert_eq!(config.max_connect_rounds, 3);
        assert_eq!(config.retry_backoff_ms, 1_000);
    }

    #[test]
    fn test_server_order() {
        let toml = format!(
            "funding_address = \"{}\"\nhost = \"electrum.mine.example\"\nport = 50001\n",
            address()
        );
        let config = PayoutConfig::from_toml_str(&toml).unwrap();
        let servers = config.servers();
        assert_eq!(servers.len(), 4);
        assert_eq!(servers[0].to_string(), "electrum.mine.example:50001");
        assert_eq!(servers[1].to_string(), "electrum1.lanacoin.com:5097");
    }

    #[test]
    fn test_fallbacks_overridable() {
        let toml = format!(
            "funding_address = \"{}\"\nfallback_servers = [\"backup.example:6000\"]\n",
            address()
        );
        let config = PayoutConfig::from_toml_str(&toml).unwrap();
        assert_eq!(config.fallback_servers, vec![ServerEndpoint::new("backup.example", 6000)]);
    }

    #[test]
    fn test_rejects_bad_values() {
        let zero_timeout = format!("funding_address = \"{}\"\ncall_timeout_ms = 0\n", address());
        assert!(matches!(
            PayoutConfig::from_toml_str(&zero_timeout),
            Err(ConfigError::Invalid(_))
        ));

        let bad_address = "funding_address = \"1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm\"";
        assert!(matches!(
            PayoutConfig::from_toml_str(bad_address),
            Err(ConfigError::Invalid(_))
        ));

        let bad_relay = format!("funding_address = \"{}\"\nrelays = [\"https://relay.example\"]\n", address());
        assert!(matches!(
            PayoutConfig::from_toml_str(&bad_relay),
            Err(ConfigError::Invalid(msg)) if msg.starts_with("relays:")
        ));

        assert!(matches!(
            PayoutConfig::from_toml_str("host = \"x\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "funding_address = \"{}\"", address()).unwrap();
        writeln!(file, "relays = [\"wss://relay.example\"]").unwrap();
        let config = PayoutConfig::load(file.path()).unwrap();
        assert_eq!(config.relays, vec!["wss://relay.example".to_string()]);
        assert_eq!(config.client_options().broadcast_timeout, Duration::from_secs(45));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            PayoutConfig::load("/nonexistent/lana.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
