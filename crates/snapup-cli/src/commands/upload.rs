//! `snapup <file> [address]` — upload one file to an appliance.
//!
//! Prints status lines as the transfer progresses; errors are returned to
//! `main`, which prints them with their hint.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use snapup_client::{Reporter, TransferEvent, Uploader, UploaderConfig};
use tracing::info;

/// Prints transfer events as human-readable lines on stdout.
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, event: &TransferEvent) {
        for line in render(event) {
            println!("{line}");
        }
    }
}

/// Lines shown for one event.
fn render(event: &TransferEvent) -> Vec<String> {
    match event {
        TransferEvent::Discovering => vec!["Discovering ...".into()],
        TransferEvent::UsingCachedAddress(address) => {
            vec![format!("Using last appliance at {address}")]
        }
        TransferEvent::Discovered(appliance) => match appliance.descriptor() {
            Some(d) => vec![format!("Found {} ({}) at {}", d.id, d.model, appliance.address)],
            None => vec![format!("Found {appliance}")],
        },
        TransferEvent::Connecting { address } => vec![format!("Connecting to {address} ...")],
        TransferEvent::AwaitingApproval => {
            vec![">>> Please tap Yes on the touchscreen to continue <<<".into()]
        }
        TransferEvent::Authorized { address, token } => vec![
            format!("IP Address\t: {address}"),
            format!("Token\t\t: {token}"),
        ],
        TransferEvent::Uploading { file_name, size } => vec![
            format!("Payload\t\t: {file_name}"),
            format!("Payload size\t: {}", format_size(*size)),
            "Sending ...".into(),
        ],
        TransferEvent::Uploaded => vec![
            "Success.".into(),
            "Start the job from the touchscreen.".into(),
        ],
    }
}

/// Upload `file` to `address`, or to the cached or discovered appliance.
pub async fn run(file: &Path, address: Option<&str>, config: UploaderConfig) -> Result<()> {
    info!(file = %file.display(), address = ?address, "upload");

    let mut uploader = Uploader::new(config)?.with_reporter(Arc::new(ConsoleReporter));
    uploader.transfer(file, address).await?;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
