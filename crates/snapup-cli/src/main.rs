//! snapup: upload a file to an appliance on the local network.
//!
//! Finds the appliance by UDP broadcast (or uses the given or last-used
//! address), waits for the session to be approved on its touchscreen,
//! and streams the file to it.

mod commands;
mod config;

use std::path::PathBuf;

use clap::Parser;
use snapup_core::SnapError;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Exit code for invalid command-line usage.
const EXIT_USAGE: i32 = 1;
/// Exit code for any failed transfer.
const EXIT_FAILURE: i32 = 255;

/// snapup: LAN appliance uploader
#[derive(Parser)]
#[command(name = "snapup", version, about = "Upload a file to an appliance on the local network")]
struct Cli {
    /// File to upload
    #[arg(env = "SLIC3R_PP_OUTPUT_NAME")]
    file: PathBuf,

    /// Appliance address; discovered on the local network when omitted
    address: Option<String>,

    /// Discovery timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Config file path
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not usage errors.
            let code = if e.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(config::Config::default_path);
    let cfg = config::Config::load(&config_path).unwrap_or_else(|e| {
        warn!("{e:#}, using defaults");
        config::Config::default()
    });

    let result = commands::upload::run(
        &cli.file,
        cli.address.as_deref(),
        cfg.to_uploader_config(cli.timeout),
    )
    .await;

    if let Err(e) = result {
        eprintln!("snapup: {e:#}");
        if let Some(hint) = e.downcast_ref::<SnapError>().and_then(SnapError::hint) {
            eprintln!("{hint}");
        }
        std::process::exit(EXIT_FAILURE);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "snapup=debug,snapup_cli=debug,snapup_client=debug,snapup_core=debug"
    } else {
        "snapup=warn,snapup_cli=warn,snapup_client=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}
