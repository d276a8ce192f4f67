//! Progress reporting seam.
//!
//! The library never prints; it emits [`TransferEvent`]s to a [`Reporter`]
//! and the binary decides how to show them.

use snapup_core::Appliance;

/// Milestones of a transfer the operator may want to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// A discovery probe is about to be broadcast.
    Discovering,
    /// The address cached by the previous run is being used.
    UsingCachedAddress(String),
    /// Discovery finished with exactly one appliance.
    Discovered(Appliance),
    /// The connect request is about to be sent.
    Connecting { address: String },
    /// The appliance waits for confirmation on its touchscreen.
    /// Emitted at most once per negotiation.
    AwaitingApproval,
    /// The session is active.
    Authorized { address: String, token: String },
    /// The payload is being sent.
    Uploading { file_name: String, size: u64 },
    /// The appliance accepted the payload.
    Uploaded,
}

/// Receives [`TransferEvent`]s.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &TransferEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn report(&self, _event: &TransferEvent) {}
}
