//! Demo service runner.
//!
//! ```text
//!   SIGINT / SIGTERM
//!          │
//!          ▼
//!   ┌──────────────┐   stop accepting   ┌────────────┐
//!   │   watcher    │ ─────────────────▶ │ HttpServer │ ◀── clients
//!   │ (shutdown    │   drain (≤ grace)  └────────────┘
//!   │  sequence)   │
//!   │              │   release          ┌──────────────┐
//!   │              │ ─────────────────▶ │ Dependencies │
//!   └──────────────┘                    └──────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use axum::{routing::get, Router};
use clap::Parser;

use service_lifecycle::config::{load_config, ServiceConfig};
use service_lifecycle::observability::{init_logging, metrics};
use service_lifecycle::{BuildInfo, Dependencies, Service, TracingLogger};

#[derive(Parser)]
#[command(name = "service-lifecycle")]
#[command(about = "Run an HTTP service with graceful, bounded shutdown", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    init_logging(&config.observability)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        read_timeout_secs = config.timeouts.read_secs,
        write_timeout_secs = config.timeouts.write_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let name = config.service.name.clone();
    let handler = Router::new().route(
        "/",
        get(move || {
            let name = name.clone();
            async move { name }
        }),
    );

    let service = Service::from_config(
        &config,
        handler,
        Arc::new(TracingLogger::new(config.service.name.clone())),
        Arc::new(Dependencies::new()),
        BuildInfo::from_build_env(),
    );

    service.run().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
