//! dledger entry point
//!
//! Parses arguments, sets up logging on stderr, dispatches to the command
//! module and exits non-zero on failure.

use std::io::{self, Write};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use decision_ledger_cli::{run, Cli};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Err(e) = run(cli, &mut out).await {
        let _ = out.flush();
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
