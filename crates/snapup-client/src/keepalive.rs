//! Background keep-alive for an active session.
//!
//! While a long upload runs the appliance would otherwise drop the session,
//! so a task queries `/status` on a fixed interval. Responses and errors are
//! ignored. Stopping joins the task, so no query is in flight afterwards.

use std::time::Duration;

use tokio::task::JoinHandle;
use snapup_core::protocol::KEEPALIVE_INTERVAL;
use tokio::time::{self, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::ApplianceApi;

/// A running keep-alive task.
pub struct KeepAliveHandle {
    stop: CancellationToken,
    task: JoinHandle<()>,
}

impl KeepAliveHandle {
    /// Spawn a keep-alive loop for `token` on `api`.
    ///
    /// A zero `interval` falls back to the protocol default.
    pub fn spawn(api: ApplianceApi, token: String, interval: Duration) -> Self {
        let stop = CancellationToken::new();
        let stopped = stop.clone();

        let task = tokio::spawn(async move {
            let mut ticker = ticker(interval);
            ticker.tick().await; // skip first immediate tick

            loop {
                tokio::select! {
                    _ = stopped.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                tokio::select! {
                    _ = stopped.cancelled() => break,
                    result = api.status(&token) => match result {
                        Ok(status) => debug!(?status, "keepalive"),
                        Err(e) => debug!(error = %e, "keepalive query failed"),
                    },
                }
            }

            debug!("keepalive loop ended");
        });

        Self { stop, task }
    }

    /// Signal the task to exit and wait until it has.
    pub async fn stop(self) {
        self.stop.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "keepalive task did not exit cleanly");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

fn ticker(interval: Duration) -> Interval {
    let period = if interval.is_zero() {
        warn!("zero keepalive interval, using {KEEPALIVE_INTERVAL:?}");
        KEEPALIVE_INTERVAL
    } else {
        interval
    };
    let mut ticker = time::interval(period);
    // A slow status query pushes the next ping back instead of bunching them.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Slot holding at most one keep-alive task.
#[derive(Default)]
pub struct KeepAlive {
    running: Option<KeepAliveHandle>,
}

impl KeepAlive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a keep-alive task unless one is already running.
    ///
    /// Returns whether a new task was started.
    pub fn start(&mut self, api: ApplianceApi, token: String, interval: Duration) -> bool {
        if self.is_running() {
            debug!("keepalive already running");
            return false;
        }
        self.running = Some(KeepAliveHandle::spawn(api, token, interval));
        true
    }

    /// Stop the running task, if any, and wait for it to exit.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.running.take() {
            handle.stop().await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(|h| !h.is_finished())
    }
}
