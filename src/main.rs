//! Main entry point for the slugkit CLI

use anyhow::Context;
use clap::Parser;
use slugkit::cli::{Cli, CliError};
use slugkit::{metrics, shutdown};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Initialize tracing on stderr, as JSON lines when `LOG_FORMAT=json`
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("slugkit=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(addr) = cli.metrics_addr {
        metrics::init_metrics(addr)
            .await
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("failed to start metrics exporter on {addr}"))?;
    }

    let shutdown = shutdown::install_ctrl_c_handler();
    cli.command.execute(&cli, shutdown).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("Command failed: {:#}", e);
        if let Some(cli_error) = e.downcast_ref::<CliError>() {
            if let Some(kind) = cli_error.kind() {
                info!("Error kind: {} ({})", kind, kind.description());
            }
            for suggestion in cli_error.suggestions() {
                info!("  - {}", suggestion);
            }
        }
        std::process::exit(1);
    }
}
