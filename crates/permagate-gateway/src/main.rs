//! Permagate gateway — entry point.
//!
//! Reads configuration from environment variables (the `config` module
//! documents the table) and starts the axum-based HTTP gateway service with
//! in-memory collaborators. Operators embed the library and supply real
//! collaborator implementations instead.

use permagate_gateway::config::GatewayConfig;
use permagate_gateway::server::GatewayServer;
use permagate_gateway::system::System;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("permagate_gateway=info".parse().unwrap()),
        )
        .init();

    let config = GatewayConfig::from_env();
    info!(
        port = config.port,
        root_host = ?config.arns_root_host,
        sandbox_protocol = ?config.sandbox_protocol,
        "Permagate gateway configuration loaded"
    );

    let system = System::in_memory();
    if let Err(e) = GatewayServer::new(config).start(system).await {
        eprintln!("Gateway error: {e}");
        std::process::exit(1);
    }
}
