//! Reflexive capabilities middleware.
//!
//! Exposes the frozen capability registry at `GET /info/capabilities` so the
//! composed pipeline can be introspected by clients.

use crate::app::GatewayApp;
use async_trait::async_trait;
use axum::{Json, Router, routing::get};
use permagate_kernel::{Capability, CapabilityRegistry, GatewayError, PipelineUnit};
use serde_json::json;

/// Declares the `reflexive` capability and serves the registry snapshot.
pub struct CapabilitiesMiddleware {
    registry: CapabilityRegistry,
}

impl CapabilitiesMiddleware {
    /// The handle is a clone of the registry the builder writes into, so the
    /// endpoint reflects every declaration made during assembly — including
    /// ones from units applied after this one.
    pub fn new(registry: CapabilityRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl PipelineUnit<GatewayApp> for CapabilitiesMiddleware {
    fn name(&self) -> &str {
        "capabilities"
    }

    async fn declare_capabilities(
        &self,
        registry: &CapabilityRegistry,
    ) -> Result<(), GatewayError> {
        registry.register(Capability::new("reflexive", "1.0.0"))
    }

    async fn apply(&self, app: GatewayApp) -> Result<GatewayApp, GatewayError> {
        let registry = self.registry.clone();
        let router = Router::new().route(
            "/info/capabilities",
            get(move || {
                let registry = registry.clone();
                async move { Json(json!({ "capabilities": registry.snapshot() })) }
            }),
        );
        Ok(app.merge(router))
    }
}
