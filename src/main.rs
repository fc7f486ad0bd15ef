use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bofh_router::application::{Cli, CommandExecutor};
use bofh_router::shared::config::ConfigLoader;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let cli = Cli::parse();

    // Priority: CLI args > config file > defaults
    let config = match &cli.config {
        Some(path) => ConfigLoader::load(path)?,
        None => ConfigLoader::load_config()?,
    };

    CommandExecutor::execute(cli.command, config).await?;
    Ok(())
}
