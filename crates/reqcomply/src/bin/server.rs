//! Analysis server binary
//!
//! Run with: cargo run -p reqcomply --bin reqcomply-server -- --config reqcomply.toml

use clap::Parser;
use reqcomply::{config::AppConfig, server::AppServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "reqcomply-server", version, about = "Requirement compliance analysis server")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides config and PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reqcomply=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            AppConfig::from_file(path)?
        }
        None => AppConfig::default(),
    }
    .apply_env()?;

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - LLM: {:?} / {}", config.llm.provider, config.llm.model);
    tracing::info!("  - Storage: {:?}", config.storage.backend);
    tracing::info!(
        "  - Concurrent jobs: {}",
        config.processing.concurrency()
    );

    let server = AppServer::new(config).await?;

    let llm = server.state().llm().clone();
    match llm.health_check().await {
        Ok(true) => tracing::info!("{} is reachable", llm.name()),
        Ok(false) | Err(_) => {
            tracing::warn!("{} is not reachable; analysis requests will fail until it is", llm.name())
        }
    }

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
