use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod probe;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // RUST_LOG=framecap=debug for per-frame detail
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(false)
        .init();

    info!("framecap probe v{}", env!("CARGO_PKG_VERSION"));

    match probe::run().await {
        Ok(()) => {
            info!("Probe finished cleanly.");
            Ok(())
        }
        Err(e) => {
            error!("Fatal error: {:#}", e);
            Err(e)
        }
    }
}
