// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{DEFAULT_LONG_POLL_WAIT_MS, DEFAULT_PUBSUB_ENDPOINT};
use crate::errors::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Configuration for the remote side of a call: trampolines, wrapper and adapters.
///
/// Protocol constants (heartbeat delay, publish attempts, batch size) are
/// fixed in [`consts`](crate::config::consts) and cannot be configured here.
///
/// # Fields
/// * `child_timeout_ms` - Configured function timeout (optional, no timeout when absent)
/// * `cpu_sample_interval_ms` - How often the local wrapper reports CPU usage (optional)
/// * `long_poll_wait_ms` - How long a receive waits for messages (defaults to 20s)
/// * `one_shot_batches` - Batch trampoline stops after the first call it finishes (defaults to true)
/// * `pubsub` - Pub/Sub REST client settings (optional)
/// * `sqs` - Region and endpoint overrides for the SQS client (optional)
///
/// # Example
/// ```yaml
/// child_timeout_ms: 30000
/// cpu_sample_interval_ms: 1000
/// long_poll_wait_ms: 20000
/// one_shot_batches: true
/// pubsub:
///   endpoint: https://pubsub.googleapis.com/v1
///   access_token: ya29.example
/// sqs:
///   region: eu-west-1
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TrampolineConfig {
    #[serde(default)]
    pub child_timeout_ms: Option<u64>,
    #[serde(default)]
    pub cpu_sample_interval_ms: Option<u64>,
    #[serde(default = "default_long_poll_wait_ms")]
    pub long_poll_wait_ms: u64,
    #[serde(default = "default_one_shot_batches")]
    pub one_shot_batches: bool,
    #[serde(default)]
    pub pubsub: PubSubConfig,
    #[serde(default)]
    pub sqs: SqsConfig,
}

fn default_long_poll_wait_ms() -> u64 {
    DEFAULT_LONG_POLL_WAIT_MS
}

fn default_one_shot_batches() -> bool {
    true
}

impl Default for TrampolineConfig {
    fn default() -> Self {
        Self {
            child_timeout_ms: None,
            cpu_sample_interval_ms: None,
            long_poll_wait_ms: DEFAULT_LONG_POLL_WAIT_MS,
            one_shot_batches: true,
            pubsub: PubSubConfig::default(),
            sqs: SqsConfig::default(),
        }
    }
}

impl TrampolineConfig {
    pub fn child_timeout(&self) -> Option<Duration> {
        self.child_timeout_ms.map(Duration::from_millis)
    }

    pub fn cpu_sample_interval(&self) -> Option<Duration> {
        self.cpu_sample_interval_ms.map(Duration::from_millis)
    }

    pub fn long_poll_wait(&self) -> Duration {
        Duration::from_millis(self.long_poll_wait_ms)
    }

    /// Reject values that would make the trampoline misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.child_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "child_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.cpu_sample_interval_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "cpu_sample_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.long_poll_wait_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "long_poll_wait_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.pubsub.endpoint.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "pubsub.endpoint",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Pub/Sub REST client settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PubSubConfig {
    #[serde(default = "default_pubsub_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

fn default_pubsub_endpoint() -> String {
    DEFAULT_PUBSUB_ENDPOINT.to_string()
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            endpoint: default_pubsub_endpoint(),
            access_token: None,
        }
    }
}

/// SQS client overrides; anything unset comes from the AWS provider chain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SqsConfig {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Load and validate a config from a YAML or TOML file, chosen by extension.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<TrampolineConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let cfg: TrampolineConfig = match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content)?,
        "toml" => toml::from_str(&content)?,
        _ => return Err(ConfigError::UnsupportedFormat { extension }),
    };

    cfg.validate()?;
    Ok(cfg)
}
