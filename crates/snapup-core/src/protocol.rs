//! Constants of the appliance protocol.
//!
//! Discovery is a single UDP broadcast answered by one datagram per
//! appliance; everything after that is plain HTTP against
//! `http://<address>:8080/api/v1`.

use std::time::Duration;

/// UDP port appliances listen on for discovery probes.
pub const DISCOVERY_PORT: u16 = 20054;

/// Probe payload broadcast during discovery.
pub const DISCOVERY_PROBE: &[u8] = b"discover";

/// How long discovery waits for replies.
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(4);

/// TCP port of the appliance HTTP API.
pub const HTTP_PORT: u16 = 8080;

/// Path prefix of every API endpoint.
pub const API_PREFIX: &str = "/api/v1";

/// Timeout for the short control requests (connect, status, disconnect).
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Delay between two approval status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Delay between two keep-alive status queries.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(3);

/// Timeout for the payload upload.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(40);

/// Status codes returned by `GET /status`.
pub mod status {
    /// Session authorized and active.
    pub const APPROVED: u16 = 200;
    /// Waiting for the operator to confirm on the touchscreen.
    pub const AWAITING_APPROVAL: u16 = 204;
    /// Token unknown, denied or expired.
    pub const UNAUTHORIZED: u16 = 401;
}

/// Build the base URL of the HTTP API for `address` on `port`.
pub fn api_base(address: &str, port: u16) -> String {
    format!("http://{address}:{port}{API_PREFIX}")
}
