//! Appliances found on the local network.

use std::fmt;

/// An appliance that answered a discovery probe.
///
/// Lives only for the duration of a run; only its address is ever cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appliance {
    /// Host the HTTP API is reachable at (the reply's sender IP).
    pub address: String,
    /// Human-readable identifier, the decoded reply body.
    pub label: String,
}

impl Appliance {
    pub fn new(address: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            label: label.into(),
        }
    }

    /// Structured view of the label, when the appliance uses the
    /// `ID@IP|model:MODEL|status:STATUS|SACP:1` reply format.
    pub fn descriptor(&self) -> Option<ApplianceDescriptor> {
        ApplianceDescriptor::parse(&self.label)
    }
}

impl fmt::Display for Appliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [ip: {}]", self.label, self.address)
    }
}

/// Fields carried by a well-formed discovery reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplianceDescriptor {
    pub id: String,
    /// Address the appliance reports for itself; may differ from the sender.
    pub ip: String,
    pub model: String,
    pub status: Option<String>,
    /// Whether the appliance also speaks the SACP protocol.
    pub sacp: bool,
}

impl ApplianceDescriptor {
    /// Parse a reply such as
    /// `Snapmaker J1X123P@192.168.1.201|model:Snapmaker J1|status:IDLE|SACP:1`.
    pub fn parse(reply: &str) -> Option<Self> {
        if !reply.contains("|model:") || !reply.contains('@') {
            return None;
        }

        let mut parts = reply.split('|');
        let head = parts.next()?;
        let (id, ip) = head.rsplit_once('@')?;

        let mut model = None;
        let mut status = None;
        let mut sacp = false;
        for part in parts {
            match part.split_once(':') {
                Some(("model", v)) => model = Some(v.trim().to_string()),
                Some(("status", v)) => status = Some(v.trim().to_string()),
                Some(("SACP", v)) => sacp = v.trim() == "1",
                _ => {}
            }
        }

        Some(Self {
            id: id.trim().to_string(),
            ip: ip.trim().to_string(),
            model: model?,
            status,
            sacp,
        })
    }
}
