use clap::Parser;
use tracing_subscriber::EnvFilter;

use a3s_chat::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { host, port } => {
            a3s_chat::cli::serve::execute(config_path, host.as_deref(), port).await?;
        }
        Commands::Ask { message, stream } => {
            a3s_chat::cli::ask::execute(config_path, &message, stream).await?;
        }
        Commands::Init { force } => {
            a3s_chat::cli::init::execute(config_path, force)?;
        }
    }

    Ok(())
}
