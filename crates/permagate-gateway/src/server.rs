//! Gateway server assembly.
//!
//! [`GatewayServer`] composes the middleware pipeline once, at startup, in a
//! fixed order: metrics, sandbox guard, ArNS resolution, gateway info, admin
//! control plane, capabilities listing, content routing. Assembly must
//! complete (or fatally abort) before the listening socket opens — there is
//! no partial-pipeline serving state.

use crate::app::GatewayApp;
use crate::config::GatewayConfig;
use crate::middleware::{
    ArIoAdminMiddleware, ArIoCoreMiddleware, ArnsMiddleware, CapabilitiesMiddleware,
    DataMiddleware, MetricsMiddleware, SandboxMiddleware,
};
use crate::routes::{DataHandler, RawDataHandler};
use crate::system::System;
use axum::Router;
use permagate_kernel::{CapabilityRegistry, GatewayError, PipelineBuilder};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Startup failure: either pipeline assembly or socket binding.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("pipeline assembly failed: {0}")]
    Pipeline(#[from] GatewayError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// High-level gateway server encapsulating pipeline assembly and serving.
pub struct GatewayServer {
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a new server from the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    /// Assemble the full request pipeline over the collaborator bundle and
    /// return the servable router.
    pub async fn build_app(&self, system: &System) -> Result<Router, GatewayError> {
        let registry = CapabilityRegistry::new();

        let data_handler = Arc::new(DataHandler::new(
            system.data_index.clone(),
            system.data_source.clone(),
            system.block_list_validator.clone(),
            system.manifest_path_resolver.clone(),
        ));
        let raw_handler = Arc::new(RawDataHandler::new(
            system.data_index.clone(),
            system.data_source.clone(),
            system.block_list_validator.clone(),
        ));

        let app = PipelineBuilder::new(registry.clone())
            .with_unit(MetricsMiddleware::new())
            .with_unit(SandboxMiddleware::new(
                self.config.arns_root_host.clone(),
                self.config.sandbox_protocol.clone(),
            ))
            .with_unit(ArnsMiddleware::new(
                self.config.arns_root_host.clone(),
                system.name_resolver.clone(),
                data_handler.clone(),
            ))
            .with_unit(ArIoCoreMiddleware::new(self.config.ar_io_wallet.clone()))
            .with_unit(ArIoAdminMiddleware::new(
                self.config.admin_api_key.clone(),
                system.data_index.clone(),
                system.prioritized_tx_ids.clone(),
                system.tx_fetcher.clone(),
            ))
            .with_unit(CapabilitiesMiddleware::new(registry.clone()))
            .with_unit(DataMiddleware::new(data_handler, raw_handler))
            .build(GatewayApp::new())
            .await?;

        Ok(app.finalize().layer(CorsLayer::permissive()))
    }

    /// Bind to `0.0.0.0:{port}` and serve until the process exits.
    pub async fn start(self, system: System) -> Result<(), StartupError> {
        let app = self.build_app(&system).await?;
        let addr = format!("0.0.0.0:{}", self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!(addr = %addr, "Permagate gateway listening");
        axum::serve(listener, app).await?;
        Ok(())
    }
}
