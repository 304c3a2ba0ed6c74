//! sqslite - local AWS SQS-compatible message broker
//!
//! Serves the SQS JSON protocol and a browsable queue overview from a single
//! in-memory engine. State lives for the lifetime of the process.

mod config;
mod router;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sqslite_queue::SqsState;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, Overrides};

#[derive(Parser, Debug)]
#[command(name = "sqslite")]
#[command(about = "Local AWS SQS-compatible message broker", long_about = None)]
struct Args {
    /// Port to listen on [default: 8080]
    #[arg(short, long, env = "SQSLITE_PORT")]
    port: Option<u16>,

    /// Host to bind to [default: 0.0.0.0]
    #[arg(long, env = "SQSLITE_HOST")]
    host: Option<String>,

    /// Account number used in queue URLs [default: 000000000000]
    #[arg(long, env = "SQSLITE_ACCOUNT_NUMBER")]
    account_number: Option<String>,

    /// Endpoint advertised in queue URLs, instead of http://<host>:<port>/<account>
    #[arg(long, env = "SQSLITE_ENDPOINT")]
    endpoint: Option<String>,

    /// Log level (trace, debug, info, warn, error) [default: info]
    #[arg(long, env = "SQSLITE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            account_number: self.account_number.clone(),
            endpoint: self.endpoint.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load(args.config.as_deref())
        .context("failed to load configuration")?
        .with_overrides(args.overrides());
    config.validate()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "sqslite={level},sqslite_queue={level},tower_http=debug",
                    level = config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let endpoint = config.endpoint();
    info!("Starting sqslite...");
    info!("  Endpoint: {}", endpoint);

    let state = Arc::new(SqsState::new(endpoint));
    let app = router::create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}
