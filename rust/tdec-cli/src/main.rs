// rust/tdec-cli/src/main.rs
// Threshold decryption client CLI - main entry point

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use clap::Parser;
use tdec_cli::cli::{self, Cli};
use tdec_cli::tracing::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = init_tracing() {
        eprintln!("warning: failed to initialize tracing: {e}");
    }

    let args = Cli::parse();
    cli::run(args).await?;
    Ok(())
}
