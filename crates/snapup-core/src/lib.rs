//! snapup-core: shared model for the snapup uploader.
//!
//! Holds the appliance and session types, the wire constants of the
//! appliance protocol, and the error taxonomy used by every snapup crate.

pub mod appliance;
pub mod error;
pub mod protocol;
pub mod session;

// Re-export commonly used items at crate root.
pub use appliance::{Appliance, ApplianceDescriptor};
pub use error::{FailureKind, SnapError, SnapResult};
pub use session::{Session, SessionState};
