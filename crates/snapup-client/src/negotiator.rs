//! Connect/approve handshake.
//!
//! ```text
//! Unauthorized --connect--> PendingApproval --status 200--> Active
//!      |                          |
//!      | no token / unreachable   | status 401
//!      v                          v
//!   failure                    Expired
//! ```
//!
//! The appliance only grants a session after the operator taps Yes on its
//! touchscreen, so the status poll waits as long as it takes unless a poll
//! ceiling is configured or the cancellation token fires.

use std::time::Duration;

use snapup_core::{Session, SessionState, SnapError, SnapResult};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{ApplianceApi, ApprovalStatus};
use crate::cache::{CacheKey, SessionCache};
use crate::report::{Reporter, TransferEvent};

/// Drives one session negotiation against an appliance.
pub struct Negotiator<'a> {
    api: &'a ApplianceApi,
    cache: &'a SessionCache,
    reporter: &'a dyn Reporter,
    poll_interval: Duration,
    max_polls: Option<u32>,
    cancel: CancellationToken,
}

impl<'a> Negotiator<'a> {
    pub fn new(api: &'a ApplianceApi, cache: &'a SessionCache, reporter: &'a dyn Reporter) -> Self {
        Self {
            api,
            cache,
            reporter,
            poll_interval: snapup_core::protocol::POLL_INTERVAL,
            max_polls: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn max_polls(mut self, max_polls: Option<u32>) -> Self {
        self.max_polls = max_polls;
        self
    }

    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the handshake, presenting `candidate_token` if one is cached.
    ///
    /// Returns an [`SessionState::Active`] session. The issued token is
    /// written to the cache as soon as it is known; clearing it after a
    /// failure is the caller's job.
    pub async fn negotiate(&self, candidate_token: Option<&str>) -> SnapResult<Session> {
        let mut session = Session::new(self.api.address());

        self.reporter.report(&TransferEvent::Connecting {
            address: session.address.clone(),
        });
        session.token = self.api.connect(candidate_token.unwrap_or_default()).await?;
        session.state = SessionState::PendingApproval;
        debug!(address = %session.address, "token issued, awaiting approval");

        if let Err(e) = self.cache.write(CacheKey::LastToken, &session.token) {
            warn!(error = %e, "failed to cache session token");
        }

        self.await_approval(&mut session).await?;
        info!(address = %session.address, "session authorized");
        Ok(session)
    }

    async fn await_approval(&self, session: &mut Session) -> SnapResult<()> {
        let mut hinted = false;
        let mut polls: u32 = 0;

        loop {
            polls += 1;
            match self.api.status(&session.token).await {
                Ok(ApprovalStatus::Approved) => {
                    session.state = SessionState::Active;
                    return Ok(());
                }
                Ok(ApprovalStatus::AwaitingApproval) => {
                    if !hinted {
                        hinted = true;
                        self.reporter.report(&TransferEvent::AwaitingApproval);
                    }
                }
                Ok(ApprovalStatus::Unauthorized) => {
                    session.state = SessionState::Expired;
                    return Err(SnapError::AuthorizationExpired);
                }
                Ok(ApprovalStatus::Other(code)) => {
                    debug!(code, "unexpected status while polling, retrying");
                }
                Err(e) => {
                    debug!(error = %e, "status poll failed, retrying");
                }
            }

            if let Some(max) = self.max_polls {
                if polls >= max {
                    return Err(SnapError::ApprovalAbandoned(format!(
                        "no approval after {polls} polls"
                    )));
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(SnapError::ApprovalAbandoned("cancelled".into()));
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}
