//! Viewer Attention Monitor - Main Entry Point

use monitor::{init_logging, load_settings, run};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== Viewer Attention Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let settings = load_settings()?;
    run(settings).await
}
