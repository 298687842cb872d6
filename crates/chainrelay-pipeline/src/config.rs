//! Relay configuration.

use crate::error::RelayError;
use crate::queue::QueueSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one relay instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Sink endpoint URL. Absent means the relay stays inert: callbacks
    /// are accepted but nothing is queued, decoded, or forwarded.
    #[serde(default)]
    pub sink_address: Option<String>,
    /// Directory holding the startup ABI seed files.
    #[serde(default = "default_abi_dir")]
    pub abi_dir: PathBuf,
    /// Maximum number of cached ABIs. Must be nonzero.
    #[serde(default = "default_abi_cache_size")]
    pub abi_cache_size: usize,
    /// Soft per-queue capacity; enqueues beyond it throttle the producer.
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,
    /// Time budget for decoding a single transaction, in milliseconds.
    #[serde(default = "default_max_decode_time_ms")]
    pub max_decode_time_ms: u64,
    /// Throttle growth/decay step per enqueue, in milliseconds.
    #[serde(default = "default_throttle_step_ms")]
    pub throttle_step_ms: u64,
    /// Upper bound on the producer delay, in milliseconds.
    #[serde(default = "default_throttle_ceiling_ms")]
    pub throttle_ceiling_ms: u64,
    /// Delay above which every throttled enqueue logs a warning.
    #[serde(default = "default_throttle_warn_ms")]
    pub throttle_warn_ms: u64,
    /// HTTP timeout for each sink call, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_abi_dir() -> PathBuf { PathBuf::from("abis") }
fn default_abi_cache_size() -> usize { 2_048 }
fn default_max_queue_size() -> usize { 512 }
fn default_max_decode_time_ms() -> u64 { 15 }
fn default_throttle_step_ms() -> u64 { 10 }
fn default_throttle_ceiling_ms() -> u64 { 5_000 }
fn default_throttle_warn_ms() -> u64 { 1_000 }
fn default_request_timeout_ms() -> u64 { 30_000 }

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            sink_address: None,
            abi_dir: default_abi_dir(),
            abi_cache_size: default_abi_cache_size(),
            max_queue_size: default_max_queue_size(),
            max_decode_time_ms: default_max_decode_time_ms(),
            throttle_step_ms: default_throttle_step_ms(),
            throttle_ceiling_ms: default_throttle_ceiling_ms(),
            throttle_warn_ms: default_throttle_warn_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl RelayConfig {
    /// Default configuration pointed at one sink endpoint.
    pub fn with_sink_address(address: impl Into<String>) -> Self {
        Self {
            sink_address: Some(address.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        let invalid = |reason: String| Err(RelayError::Config { reason });
        if self.abi_cache_size == 0 {
            return invalid("abi_cache_size must be nonzero".into());
        }
        if self.max_queue_size == 0 {
            return invalid("max_queue_size must be nonzero".into());
        }
        if self.max_decode_time_ms == 0 {
            return invalid("max_decode_time_ms must be nonzero".into());
        }
        if self.throttle_step_ms == 0 {
            return invalid("throttle_step_ms must be nonzero".into());
        }
        if let Some(address) = &self.sink_address {
            let url = url::Url::parse(address)
                .map_err(|e| RelayError::Config {
                    reason: format!("sink_address '{address}' is not a valid URL: {e}"),
                })?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return invalid(format!(
                    "sink_address '{address}' must use http or https"
                ));
            }
        }
        Ok(())
    }

    pub fn decode_budget(&self) -> Duration {
        Duration::from_millis(self.max_decode_time_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn queue_settings(&self) -> QueueSettings {
        QueueSettings {
            max_queue_size: self.max_queue_size,
            throttle_step: Duration::from_millis(self.throttle_step_ms),
            throttle_ceiling: Duration::from_millis(self.throttle_ceiling_ms),
            throttle_warn: Duration::from_millis(self.throttle_warn_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(RelayConfig::default().validate().is_ok());
        assert!(RelayConfig::with_sink_address("http://localhost:50051")
            .validate()
            .is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: RelayConfig =
            serde_json::from_str(r#"{ "sink_address": "http://sink:8080" }"#).unwrap();
        assert_eq!(config.max_queue_size, 512);
        assert_eq!(config.abi_cache_size, 2_048);
        assert_eq!(config.throttle_step_ms, 10);
        assert_eq!(config.sink_address.as_deref(), Some("http://sink:8080"));
    }

    #[test]
    fn rejects_zero_cache_size() {
        let config = RelayConfig {
            abi_cache_size: 0,
            ..RelayConfig::default()
        };
        assert!(matches!(config.validate(), Err(RelayError::Config { .. })));
    }

    #[test]
    fn rejects_non_http_sink_address() {
        let config = RelayConfig::with_sink_address("ftp://sink:21");
        assert!(matches!(config.validate(), Err(RelayError::Config { .. })));
        let config = RelayConfig::with_sink_address("not a url");
        assert!(matches!(config.validate(), Err(RelayError::Config { .. })));
    }
}
