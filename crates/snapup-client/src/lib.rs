//! snapup-client: client library for uploading payloads to LAN appliances.
//!
//! Finds an appliance with a UDP broadcast probe, negotiates a session token
//! through the connect/approve handshake, keeps the session alive while the
//! payload streams up, and caches the last address and token between runs.
//!
//! # Quick Start
//!
//! ```no_run
//! use snapup_client::{Uploader, UploaderConfig};
//!
//! # async fn example() -> snapup_core::SnapResult<()> {
//! let mut uploader = Uploader::new(UploaderConfig::default())?;
//! let report = uploader.transfer("model.gcode".as_ref(), None).await?;
//! println!("uploaded {} bytes to {}", report.size, report.address);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod discovery;
pub mod keepalive;
pub mod negotiator;
pub mod payload;
pub mod report;
pub mod transfer;

// Re-export primary public types.
pub use api::{ApplianceApi, ApprovalStatus};
pub use cache::{CacheKey, SessionCache};
pub use config::UploaderConfig;
pub use discovery::{discover, discover_at, BroadcastLocator, Locator};
pub use keepalive::{KeepAlive, KeepAliveHandle};
pub use negotiator::Negotiator;
pub use payload::Payload;
pub use report::{NoopReporter, Reporter, TransferEvent};
pub use transfer::{TransferReport, Uploader};

// Re-export snapup-core error types for convenience.
pub use snapup_core::{SnapError, SnapResult};
