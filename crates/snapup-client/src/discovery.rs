//! UDP broadcast discovery of appliances.
//!
//! One probe is sent to the broadcast address; every datagram that arrives
//! before the timeout is one appliance. There is no retry: an empty result
//! means nothing answered within the window, several results mean the caller
//! has to choose.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use snapup_core::protocol::{DISCOVERY_PORT, DISCOVERY_PROBE, DISCOVERY_TIMEOUT};
use snapup_core::{Appliance, SnapError, SnapResult};
use tokio::net::UdpSocket;
use tokio::time::{self, Instant};
use tracing::{debug, info};

/// Largest reply we accept; appliance labels are far smaller.
const MAX_REPLY: usize = 1500;

/// Broadcast `probe` to `255.255.255.255:port` and collect replies until
/// `timeout` elapses.
pub async fn discover(probe: &[u8], port: u16, timeout: Duration) -> SnapResult<Vec<Appliance>> {
    discover_at(probe, SocketAddr::from((Ipv4Addr::BROADCAST, port)), timeout).await
}

/// Send `probe` to `target` and collect one appliance per distinct sender
/// IP until `timeout` elapses.
pub async fn discover_at(
    probe: &[u8],
    target: SocketAddr,
    timeout: Duration,
) -> SnapResult<Vec<Appliance>> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .await
        .map_err(SnapError::Discovery)?;
    socket.set_broadcast(true).map_err(SnapError::Discovery)?;

    debug!(%target, "sending discovery probe");
    socket
        .send_to(probe, target)
        .await
        .map_err(SnapError::Discovery)?;

    let deadline = Instant::now() + timeout;
    let mut senders: Vec<IpAddr> = Vec::new();
    let mut found = Vec::new();
    let mut buf = vec![0u8; MAX_REPLY];

    loop {
        let (n, src) = match time::timeout_at(deadline, socket.recv_from(&mut buf)).await {
            Err(_) => break,
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                debug!(error = %e, "discovery recv error");
                continue;
            }
        };

        // Appliances are keyed by IP; a second port on the same host is a duplicate.
        if senders.contains(&src.ip()) {
            debug!(%src, "duplicate discovery reply");
            continue;
        }
        senders.push(src.ip());

        let label = String::from_utf8_lossy(&buf[..n]).trim().to_string();
        debug!(%src, %label, "discovery reply");
        found.push(Appliance::new(src.ip().to_string(), label));
    }

    info!(count = found.len(), "discovery finished");
    Ok(found)
}

/// Source of candidate appliances for a transfer.
#[async_trait]
pub trait Locator: Send + Sync {
    async fn locate(&self) -> SnapResult<Vec<Appliance>>;
}

/// Locates appliances with a single UDP broadcast probe.
#[derive(Debug, Clone)]
pub struct BroadcastLocator {
    pub probe: Vec<u8>,
    pub target: SocketAddr,
    pub timeout: Duration,
}

impl BroadcastLocator {
    /// Broadcast the standard probe on `port`.
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self {
            probe: DISCOVERY_PROBE.to_vec(),
            target: SocketAddr::from((Ipv4Addr::BROADCAST, port)),
            timeout,
        }
    }
}

impl Default for BroadcastLocator {
    fn default() -> Self {
        Self::new(DISCOVERY_PORT, DISCOVERY_TIMEOUT)
    }
}

#[async_trait]
impl Locator for BroadcastLocator {
    async fn locate(&self) -> SnapResult<Vec<Appliance>> {
        discover_at(&self.probe, self.target, self.timeout).await
    }
}
