//! # sessiondeck
//!
//! Run commands in their own terminal windows, keep track of them across
//! restarts, and checkpoint or roll back the files they change.
//!
//! ## Architecture
//!
//! This is Layer 2 - the binary that ties together:
//! - sessiondeck-core: Core types and configuration
//! - sessiondeck-session: Session lifecycle
//! - sessiondeck-checkpoint: Checkpoint, diff and rollback

use clap::Parser;
use sessiondeck::{load_config, run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // Initialize logging; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        "sessiondeck v{} using data dir {}",
        env!("CARGO_PKG_VERSION"),
        config.data_dir().display()
    );

    run(cli, config).await.map_err(|e| {
        tracing::error!("{:#}", e);
        e
    })
}
