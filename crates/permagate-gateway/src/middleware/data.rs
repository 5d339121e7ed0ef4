//! Content path-routing middleware.
//!
//! Installs the router fallback that pattern-matches request paths into raw
//! vs. manifest-relative content requests. The handlers themselves live in
//! [`crate::routes::data`]; this unit only owns the dispatch wiring.

use crate::app::GatewayApp;
use crate::routes::data::{DataHandler, RawDataHandler, dispatch};
use async_trait::async_trait;
use axum::extract::Request;
use permagate_kernel::{Capability, CapabilityRegistry, GatewayError, PipelineUnit};
use std::sync::Arc;

/// Declares the `arweave-id-lookup` capability and installs content dispatch.
pub struct DataMiddleware {
    data_handler: Arc<DataHandler>,
    raw_handler: Arc<RawDataHandler>,
}

impl DataMiddleware {
    pub fn new(data_handler: Arc<DataHandler>, raw_handler: Arc<RawDataHandler>) -> Self {
        Self {
            data_handler,
            raw_handler,
        }
    }
}

#[async_trait]
impl PipelineUnit<GatewayApp> for DataMiddleware {
    fn name(&self) -> &str {
        "data"
    }

    async fn declare_capabilities(
        &self,
        registry: &CapabilityRegistry,
    ) -> Result<(), GatewayError> {
        registry.register(Capability::new("arweave-id-lookup", "1.0.0"))
    }

    async fn apply(&self, app: GatewayApp) -> Result<GatewayApp, GatewayError> {
        let data_handler = self.data_handler.clone();
        let raw_handler = self.raw_handler.clone();
        Ok(app.fallback(move |req: Request| {
            let data_handler = data_handler.clone();
            let raw_handler = raw_handler.clone();
            async move { dispatch(req, data_handler, raw_handler).await }
        }))
    }
}
