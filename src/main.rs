//! Employee Service (v1)
//!
//! A small CRUD service for employee records built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────────────┐
//!                    │                   EMPLOYEE SERVICE                     │
//!                    │                                                        │
//!   Client Request   │  ┌────────────┐   ┌──────────────┐   ┌─────────────┐  │
//!   ─────────────────┼─▶│  request   │──▶│   logging    │──▶│   routing   │  │
//!                    │  │ id / limit │   │   filter     │   │   table     │  │
//!                    │  └────────────┘   │ (capture)    │   └──────┬──────┘  │
//!                    │                   └──────▲───────┘          │         │
//!                    │                          │                  ▼         │
//!   Client Response  │                   ┌──────┴───────┐   ┌─────────────┐  │
//!   ◀────────────────┼───────────────────│ flush + log  │◀──│  employee   │  │
//!                    │                   └──────────────┘   │  resource   │  │
//!                    │                                      └──────┬──────┘  │
//!                    │                                             ▼         │
//!                    │                                      ┌─────────────┐  │
//!                    │                                      │ repository  │  │
//!                    │                                      └─────────────┘  │
//!                    └───────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use employee_service::config::{load_config, ServiceConfig};
use employee_service::employee::InMemoryEmployeeRepository;
use employee_service::lifecycle::{signals, Shutdown};
use employee_service::observability::{logging, metrics};
use employee_service::HttpServer;

#[derive(Parser)]
#[command(name = "employee-service")]
#[command(about = "Employee CRUD service", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    logging::init(&config.observability)?;

    tracing::info!("employee-service v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        capture_enabled = config.capture.enabled,
        max_request_payload_bytes = config.capture.max_request_payload_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let repository = Arc::new(match &config.storage.snapshot_path {
        Some(path) => InMemoryEmployeeRepository::load_from_file(path)?,
        None => InMemoryEmployeeRepository::new(),
    });

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::forward_to(shutdown);

    let server = HttpServer::with_repository(config, repository.clone());
    server.run(listener, server_shutdown).await?;

    repository.save_to_file()?;

    tracing::info!("Shutdown complete");
    Ok(())
}
