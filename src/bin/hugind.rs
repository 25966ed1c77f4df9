//! hugind — Hugin daemon.
//!
//! Serves the [`IntelligenceProxy`](hugin::IntelligenceProxy) over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use hugin::server::config::{Config, Secrets};
use hugin::{Hugin, HuginError, IntelligenceProxy};

/// Hugin daemon — cache-first intelligence proxy.
#[derive(Parser)]
#[command(name = "hugind")]
#[command(version)]
#[command(about = "Hugin intelligence proxy daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address from the config file.
    #[arg(long, env = "HUGIN_ADDRESS")]
    address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("hugin=info,hugind=info")),
        )
        .init();

    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::load()?;

    let proxy = build_proxy(&config, &secrets)?;

    let address = args.address.unwrap_or_else(|| config.server.address.clone());
    let addr: SocketAddr = address
        .parse()
        .map_err(|e| HuginError::Configuration(format!("Invalid address {address:?}: {e}")))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        %addr,
        enabled = config.intelligence.enabled,
        "hugind starting"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, hugin::server::router(Arc::new(proxy)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("hugind stopped");
    Ok(())
}

/// Build an [`IntelligenceProxy`] from configuration.
fn build_proxy(config: &Config, secrets: &Secrets) -> Result<IntelligenceProxy, HuginError> {
    let api_key = secrets.api_key();
    if config.intelligence.enabled && api_key.is_none() {
        warn!("no intelligence API key configured; upstream requests are unauthenticated");
    }

    Hugin::builder()
        .enabled(config.intelligence.enabled)
        .upstream(config.upstream_config(api_key))
        .holdings(Arc::new(config.holdings()))
        .cache(config.cache_config())
        .retry(config.retry_config())
        .build()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
