//! Client configuration at `~/.snapup/config.toml`.
//!
//! Every field is optional; CLI flags always override config file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use snapup_client::UploaderConfig;
use snapup_core::protocol;
use tracing::debug;

/// Top-level config file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

/// Ports and discovery window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    #[serde(default = "default_discovery_port")]
    pub discovery_port: u16,

    #[serde(default = "default_discovery_timeout_secs")]
    pub discovery_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            discovery_port: default_discovery_port(),
            discovery_timeout_secs: default_discovery_timeout_secs(),
        }
    }
}

/// Handshake, keep-alive and upload timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Give up waiting for touchscreen approval after this many polls.
    #[serde(default)]
    pub max_polls: Option<u32>,

    #[serde(default = "default_keepalive_interval_secs")]
    pub keepalive_interval_secs: u64,

    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,

    /// Where the last address and token are kept (default: OS temp dir).
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_polls: None,
            keepalive_interval_secs: default_keepalive_interval_secs(),
            upload_timeout_secs: default_upload_timeout_secs(),
            cache_dir: None,
        }
    }
}

fn default_http_port() -> u16 {
    protocol::HTTP_PORT
}

fn default_discovery_port() -> u16 {
    protocol::DISCOVERY_PORT
}

fn default_discovery_timeout_secs() -> u64 {
    protocol::DISCOVERY_TIMEOUT.as_secs()
}

fn default_poll_interval_secs() -> u64 {
    protocol::POLL_INTERVAL.as_secs()
}

fn default_keepalive_interval_secs() -> u64 {
    protocol::KEEPALIVE_INTERVAL.as_secs()
}

fn default_upload_timeout_secs() -> u64 {
    protocol::UPLOAD_TIMEOUT.as_secs()
}

impl Config {
    /// Load configuration from a TOML file, returning defaults if the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config at {}", path.display()))?;

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Reject settings that would make the session loops spin.
    pub fn validate(&self) -> Result<()> {
        if self.session.poll_interval_secs == 0 {
            bail!("session.poll_interval_secs must be at least 1");
        }
        if self.session.keepalive_interval_secs == 0 {
            bail!("session.keepalive_interval_secs must be at least 1");
        }
        Ok(())
    }

    /// Default location, `~/.snapup/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_default()
            .join(".snapup")
            .join("config.toml")
    }

    /// Translate into library settings, with an optional discovery timeout
    /// override from the command line.
    pub fn to_uploader_config(&self, discovery_timeout_secs: Option<u64>) -> UploaderConfig {
        let timeout = discovery_timeout_secs.unwrap_or(self.network.discovery_timeout_secs);

        UploaderConfig {
            http_port: self.network.http_port,
            discovery_port: self.network.discovery_port,
            discovery_timeout: Duration::from_secs(timeout),
            poll_interval: Duration::from_secs(self.session.poll_interval_secs),
            max_polls: self.session.max_polls,
            keepalive_interval: Duration::from_secs(self.session.keepalive_interval_secs),
            upload_timeout: Duration::from_secs(self.session.upload_timeout_secs),
            cache_dir: self
                .session
                .cache_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
            ..UploaderConfig::default()
        }
    }
}
