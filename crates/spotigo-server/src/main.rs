//! spotigo - Entry Point

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Server-rendered Spotify front-end
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML configuration file layered under the environment
    #[arg(short, long, env = spotigo_server::CONFIG_PATH_ENV)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    spotigo_telemetry::init_logging()?;

    info!("Starting spotigo v{}", env!("CARGO_PKG_VERSION"));

    let config = spotigo_server::AppConfig::load(args.config.as_deref())?;
    info!(config = ?config.sanitized(), "Configuration loaded");

    let app = spotigo_server::Application::new(config)?;
    app.run().await?;

    Ok(())
}
