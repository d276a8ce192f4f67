use thiserror::Error;

use crate::appliance::Appliance;

/// Errors produced while locating, authorizing or uploading to an appliance.
#[derive(Debug, Error)]
pub enum SnapError {
    #[error("discovery failed: {0}")]
    Discovery(std::io::Error),

    #[error("no appliance answered the discovery probe")]
    NoApplianceFound,

    #[error("connect failed: {0}")]
    ConnectFailed(String),

    #[error("found {} appliances:\n{}", .0.len(), list_appliances(.0))]
    AmbiguousTarget(Vec<Appliance>),

    #[error("session authorization expired or was denied")]
    AuthorizationExpired,

    #[error("gave up waiting for approval: {0}")]
    ApprovalAbandoned(String),

    #[error("upload rejected ({status}): {body}")]
    SubmissionRejected { status: u16, body: String },

    #[error("upload failed: {0}")]
    SubmissionFailed(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("http client error: {0}")]
    Http(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`SnapError`], used to pick hints and
/// cache invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ConnectivityFailure,
    AmbiguousTarget,
    AuthorizationExpired,
    SubmissionRejected,
    InvalidInput,
    Cancelled,
}

impl SnapError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Discovery(_)
            | Self::NoApplianceFound
            | Self::ConnectFailed(_)
            | Self::SubmissionFailed(_)
            | Self::Http(_)
            | Self::Io(_) => FailureKind::ConnectivityFailure,
            Self::AmbiguousTarget(_) => FailureKind::AmbiguousTarget,
            Self::AuthorizationExpired => FailureKind::AuthorizationExpired,
            Self::ApprovalAbandoned(_) => FailureKind::Cancelled,
            Self::SubmissionRejected { .. } => FailureKind::SubmissionRejected,
            Self::InvalidInput(_) => FailureKind::InvalidInput,
        }
    }

    /// Actionable advice for the operator, if there is any beyond the error.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NoApplianceFound | Self::Discovery(_) => Some(
                "No machines detected. Check that the appliance is powered on and on the same network.",
            ),
            Self::ConnectFailed(_) => Some("Please check the touchscreen and tap Disconnect."),
            Self::AmbiguousTarget(_) => {
                Some("Pass the appliance address as the second argument to pick one.")
            }
            Self::AuthorizationExpired => {
                Some("Screen authorization needed. Tap Yes on the touchscreen when asked.")
            }
            Self::ApprovalAbandoned(_) => {
                Some("The session was not approved on the touchscreen in time.")
            }
            _ => None,
        }
    }

    /// Whether the cached session token must be discarded after this error.
    pub fn clears_cached_token(&self) -> bool {
        matches!(
            self,
            Self::ConnectFailed(_) | Self::AuthorizationExpired | Self::ApprovalAbandoned(_)
        )
    }
}

fn list_appliances(appliances: &[Appliance]) -> String {
    appliances
        .iter()
        .map(|a| format!("> {a}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub type SnapResult<T> = Result<T, SnapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_target_lists_every_appliance() {
        let err = SnapError::AmbiguousTarget(vec![
            Appliance::new("10.0.0.2", "A350"),
            Appliance::new("10.0.0.3", "J1"),
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("found 2 appliances"));
        assert!(msg.contains("> A350 [ip: 10.0.0.2]"));
        assert!(msg.contains("> J1 [ip: 10.0.0.3]"));
    }

    #[test]
    fn connect_and_expiry_hints_differ() {
        let connect = SnapError::ConnectFailed("refused".into());
        let expired = SnapError::AuthorizationExpired;
        assert_ne!(connect.hint(), expired.hint());
        assert!(connect.hint().unwrap().contains("Disconnect"));
        assert!(expired.hint().unwrap().contains("touchscreen"));
    }

    #[test]
    fn negotiation_failures_clear_the_token() {
        assert!(SnapError::ConnectFailed("x".into()).clears_cached_token());
        assert!(SnapError::AuthorizationExpired.clears_cached_token());
        assert!(!SnapError::NoApplianceFound.clears_cached_token());
        assert!(!SnapError::SubmissionRejected { status: 500, body: String::new() }
            .clears_cached_token());
        assert!(SnapError::ApprovalAbandoned("cancelled".into()).clears_cached_token());
    }

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(SnapError::NoApplianceFound.kind(), FailureKind::ConnectivityFailure);
        assert_eq!(
            SnapError::InvalidInput("dir".into()).kind(),
            FailureKind::InvalidInput
        );
        assert_eq!(
            SnapError::SubmissionRejected { status: 413, body: "too big".into() }.kind(),
            FailureKind::SubmissionRejected
        );
        assert_eq!(SnapError::AuthorizationExpired.kind(), FailureKind::AuthorizationExpired);
    }
}
