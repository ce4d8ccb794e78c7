//! restgate server binary.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use restgate_core::db::PgRunner;
use restgate_server::{Server, ServerConfig};

/// Auto-generated REST gateway over PostgreSQL.
#[derive(Debug, Parser)]
#[command(name = "restgate", version, about)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, env = "RESTGATE_CONFIG")]
    config: Option<PathBuf>,

    /// PostgreSQL connection URL. The one required binding.
    #[arg(long, env = "RESTGATE_DATABASE_URL")]
    database_url: Option<String>,

    /// Server bind address.
    #[arg(long, env = "RESTGATE_BIND_ADDR")]
    bind_addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "restgate=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path).map_err(anyhow::Error::msg)?,
        None => ServerConfig::default(),
    };
    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }
    if let Some(bind_addr) = cli.bind_addr {
        config.bind_addr = bind_addr;
    }
    config.validate().map_err(anyhow::Error::msg)?;

    tracing::info!("restgate v{}", env!("CARGO_PKG_VERSION"));

    let runner = PgRunner::with_pool_size(&config.database_url, config.pool_max_size).await?;
    let server = Server::new(config, Arc::new(runner));
    server.serve().await?;

    Ok(())
}
