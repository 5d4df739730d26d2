//! Concurrent fan-out of signed events to relays

use futures_util::future::join_all;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::config::PayoutConfig;
use crate::wallet::KeyMaterial;

use super::{ProfileMetadata, RelayError, SignedEvent};

/// Per-relay wait for the `OK` acknowledgement, connect included
pub const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome for one relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayResult {
    pub url: String,
    pub success: bool,
    pub error: Option<String>,
    pub response_time_ms: u64,
}

/// Aggregate over every relay a publish targeted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub details: Vec<RelayResult>,
}

impl RelayReport {
    pub fn from_results(details: Vec<RelayResult>) -> Self {
        let successful = details.iter().filter(|r| r.success).count();
        Self {
            total: details.len(),
            successful,
            failed: details.len() - successful,
            details,
        }
    }
}

/// What a profile publish hands back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishOutcome {
    pub event_id: String,
    pub report: RelayReport,
}

/// `["OK", id, accepted, message]` for our event, anything else is `None`
pub fn parse_ok_message(text: &str, event_id: &str) -> Option<(bool, String)> {
    let value: Value = serde_json::from_str(text).ok()?;
    let frame = value.as_array()?;
    if frame.first()?.as_str()? != "OK" || frame.get(1)?.as_str()? != event_id {
        return None;
    }
    let accepted = frame.get(2).and_then(Value::as_bool).unwrap_or(false);
    let message = frame
        .get(3)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some((accepted, message))
}

pub(crate) fn check_url(url: &str) -> Result<(), RelayError> {
    if url.starts_with("wss://") || url.starts_with("ws://") {
        Ok(())
    } else {
        Err(RelayError::InvalidUrl(url.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct RelayPublisher {
    timeout: Duration,
    /// Targets for `publish_profile_configured`
    relays: Vec<String>,
}

impl Default for RelayPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_RELAY_TIMEOUT)
    }
}

impl RelayPublisher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            relays: Vec::new(),
        }
    }

    /// Timeout and relay list from the `relays` config section
    pub fn from_config(config: &PayoutConfig) -> Self {
        Self {
            timeout: config.relay_timeout(),
            relays: config.relays.clone(),
        }
    }

    pub fn relays(&self) -> &[String] {
        &self.relays
    }

    /// Send `event` to every relay at once. Never fails: each relay's
    /// failure is recorded in the report.
    pub async fn publish(&self, event: &SignedEvent, relays: &[String]) -> RelayReport {
        let message = match event.to_relay_message() {
            Ok(message) => message,
            Err(e) => {
                let details = relays
                    .iter()
                    .map(|url| RelayResult {
                        url: url.clone(),
                        success: false,
                        error: Some(e.to_string()),
                        response_time_ms: 0,
                    })
                    .collect();
                return RelayReport::from_results(details);
            }
        };

        let sends = relays
            .iter()
            .map(|url| self.send_one(url, &message, &event.id));
        let report = RelayReport::from_results(join_all(sends).await);
        info!(
            event_id = %event.id,
            successful = report.successful,
            total = report.total,
            "event published"
        );
        report
    }

    /// Sign `profile` with `key` and publish it
    pub async fn publish_profile(
        &self,
        key: &KeyMaterial,
        profile: &ProfileMetadata,
        relays: &[String],
    ) -> Result<PublishOutcome, RelayError> {
        let event = profile.to_event(key)?;
        let report = self.publish(&event, relays).await;
        Ok(PublishOutcome {
            event_id: event.id,
            report,
        })
    }

    /// `publish_profile` to the relays this publisher was configured with
    pub async fn publish_profile_configured(
        &self,
        key: &KeyMaterial,
        profile: &ProfileMetadata,
    ) -> Result<PublishOutcome, RelayError> {
        self.publish_profile(key, profile, &self.relays).await
    }

    async fn send_one(&self, url: &str, message: &str, event_id: &str) -> RelayResult {
        let start = Instant::now();
        let outcome = match timeout(self.timeout, exchange(url, message, event_id)).await {
            Ok(result) => result,
            Err(_) => Err(RelayError::Timeout),
        };
        let response_time_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok((true, _)) => {
                debug!(relay = url, response_time_ms, "relay accepted event");
                RelayResult {
                    url: url.to_string(),
                    success: true,
                    error: None,
                    response_time_ms,
                }
            }
            Ok((false, reason)) => {
                warn!(relay = url, %reason, "relay rejected event");
                RelayResult {
                    url: url.to_string(),
                    success: false,
                    error: Some(reason),
                    response_time_ms,
                }
            }
            Err(e) => {
                warn!(relay = url, error = %e, "relay publish failed");
                RelayResult {
                    url: url.to_string(),
                    success: false,
                    error: Some(e.to_string()),
                    response_time_ms,
                }
            }
        }
    }
}

async fn exchange(url: &str, message: &str, event_id: &str) -> Result<(bool, String), RelayError> {
    check_url(url)?;
    let (mut ws, _response) = connect_async(url)
        .await
        .map_err(|e| RelayError::Connect(e.to_string()))?;
    ws.send(Message::Text(message.to_string()))
        .await
        .map_err(|e| RelayError::Connect(e.to_string()))?;

    while let Some(frame) = ws.next().await {
        match frame.map_err(|e| RelayError::Connect(e.to_string()))? {
            Message::Text(text) => match parse_ok_message(&text, event_id) {
                Some(ack) => {
                    let _ = ws.close(None).await;
                    return Ok(ack);
                }
                None => debug!(relay = url, %text, "ignoring relay message"),
            },
            Message::Close(_) => return Err(RelayError::Closed),
            _ => {}
        }
    }
    Err(RelayError::Closed)
}
