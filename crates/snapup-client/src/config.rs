//! Tunables for an [`Uploader`](crate::Uploader) run.

use std::path::PathBuf;
use std::time::Duration;

use snapup_core::protocol;

/// Configuration for talking to an appliance.
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// Port of the appliance HTTP API.
    pub http_port: u16,
    /// UDP port discovery probes are broadcast to.
    pub discovery_port: u16,
    /// How long to collect discovery replies.
    pub discovery_timeout: Duration,
    /// Timeout for connect, status and disconnect requests.
    pub request_timeout: Duration,
    /// Delay between approval status polls.
    pub poll_interval: Duration,
    /// Upper bound on approval polls (None = wait for the operator forever).
    pub max_polls: Option<u32>,
    /// Delay between keep-alive queries during an upload.
    pub keepalive_interval: Duration,
    /// Timeout for the whole upload request.
    pub upload_timeout: Duration,
    /// Directory holding the cached address and token.
    pub cache_dir: PathBuf,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            http_port: protocol::HTTP_PORT,
            discovery_port: protocol::DISCOVERY_PORT,
            discovery_timeout: protocol::DISCOVERY_TIMEOUT,
            request_timeout: protocol::REQUEST_TIMEOUT,
            poll_interval: protocol::POLL_INTERVAL,
            max_polls: None,
            keepalive_interval: protocol::KEEPALIVE_INTERVAL,
            upload_timeout: protocol::UPLOAD_TIMEOUT,
            cache_dir: std::env::temp_dir(),
        }
    }
}
