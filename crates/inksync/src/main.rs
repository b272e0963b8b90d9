//! inksync-server binary entry point.
//!
//! Usage:
//! ```bash
//! inksync-server --config inksync.toml
//! ```

use std::path::PathBuf;

use anyhow::Context;
use inksync::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = get_config_path();
    let config = Config::from_file(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), config = %path.display(), "starting inksync-server");
    inksync::serve(&config).await?;
    Ok(())
}

fn get_config_path() -> PathBuf {
    std::env::args()
        .skip_while(|arg| arg != "--config")
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("inksync.toml"))
}
