use anyhow::Result;
use tracing::info;

use kestrel_uci::UciEngine;

fn main() -> Result<()> {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    info!(version = env!("CARGO_PKG_VERSION"), "kestrel starting");
    UciEngine::new().run()?;
    Ok(())
}
