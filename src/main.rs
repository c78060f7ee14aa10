//! Data Gateway - main entry point.
//!
//! Connects to the store, then serves the configured table on one HTTP
//! route. If the store cannot be reached the process exits non-zero without
//! ever binding its port.

use clap::Parser;
use data_gateway::config::GatewayConfig;
use data_gateway::gateway::{HttpServer, QueryGateway};
use data_gateway::logging::init_tracing;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = GatewayConfig::parse();

    init_tracing(&config.log_level, config.json_logs);

    config.validate()?;
    let conn_config = config.connection_config()?;

    info!(
        table = %conn_config.table,
        route = %config.route,
        "Starting data gateway v{}",
        env!("CARGO_PKG_VERSION")
    );

    let gateway = QueryGateway::connect(&conn_config, config.query_timeout_duration()).await?;

    let server = HttpServer::new(
        Arc::new(gateway),
        &config.http_host,
        config.http_port,
        &config.route,
    );

    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
