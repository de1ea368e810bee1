//! Configuration for the sync subsystem

use crate::transport::RequestConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the sync service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Remote API base URL, prepended to every queued endpoint
    pub base_url: String,

    /// Directory holding the persisted queue file
    pub storage_dir: PathBuf,

    /// Per-call transport behavior (timeout and in-call retry)
    #[serde(default)]
    pub transport: TransportConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            storage_dir: PathBuf::from(".medidiet/sync"),
            transport: TransportConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Load config from TOML file
    pub fn from_toml(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            anyhow::bail!("base_url must start with http:// or https://");
        }
        if self.storage_dir.as_os_str().is_empty() {
            anyhow::bail!("storage_dir cannot be empty");
        }
        Ok(())
    }
}

/// Per-call transport knobs.
///
/// This is the immediate in-call retry, distinct from the queue's
/// across-session retry: exhausting these attempts leaves the item queued
/// for a future drain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Additional attempts after the first failure (0 = single attempt)
    pub retries: u32,

    /// Fixed delay between attempts, in milliseconds
    pub retry_delay_ms: u64,

    /// Per-attempt timeout, in milliseconds
    pub timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            retries: 0,
            retry_delay_ms: 1_000,
            timeout_ms: 10_000,
        }
    }
}

impl TransportConfig {
    /// Convert to the per-request config consumed by the transport
    pub fn request_config(&self) -> RequestConfig {
        RequestConfig {
            retries: self.retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SyncConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let config = SyncConfig {
            base_url: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_storage_dir() {
        let config = SyncConfig {
            storage_dir: PathBuf::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_transport_defaults_match_client() {
        let transport = TransportConfig::default();
        assert_eq!(transport.retries, 0);
        assert_eq!(transport.retry_delay_ms, 1_000);
        assert_eq!(transport.timeout_ms, 10_000);
    }
}
