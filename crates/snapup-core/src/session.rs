//! Session state for a negotiated appliance connection.

/// Where a session is in the connect/approve handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No token yet, or the connect request failed.
    Unauthorized,
    /// The appliance issued a token; the operator has not confirmed it.
    PendingApproval,
    /// The token is authorized for uploads.
    Active,
    /// The appliance rejected the token while polling.
    Expired,
}

/// A tokened interaction window with one appliance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub address: String,
    pub token: String,
    pub state: SessionState,
}

impl Session {
    /// A fresh session for `address`, before any connect request.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: String::new(),
            state: SessionState::Unauthorized,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_unauthorized() {
        let s = Session::new("10.0.0.2");
        assert_eq!(s.state, SessionState::Unauthorized);
        assert!(s.token.is_empty());
        assert!(!s.is_active());
    }
}
