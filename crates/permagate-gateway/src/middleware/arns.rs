//! ArNS name-resolution middleware.
//!
//! Maps a single-label subdomain to a content identifier via the
//! name-resolution collaborator and dispatches to the manifest-aware content
//! handler, attaching cache hints for intermediaries. An unresolvable name is
//! a 404 — nothing later in the pipeline sees the request.

use crate::app::GatewayApp;
use crate::routes::data::{DataHandler, send_not_found};
use crate::stage::{RequestStage, StageAction, request_subdomain};
use async_trait::async_trait;
use axum::extract::Request;
use axum::http::{HeaderValue, header};
use permagate_kernel::{
    Capability, CapabilityRegistry, GatewayError, NameResolver, PipelineUnit,
};
use std::sync::Arc;
use tracing::debug;

const EXCLUDED_SUBDOMAINS: &[&str] = &["www"];

/// Upper bound on an ArNS name label that cannot be a sandbox label by
/// shape. Sandbox labels (base32 of 32 bytes) are always 52 characters.
const MAX_ARNS_NAME_LENGTH: usize = 48;

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline unit
// ─────────────────────────────────────────────────────────────────────────────

/// Declares the `ArNs` capability and installs the resolution stage.
pub struct ArnsMiddleware {
    root_host: Option<String>,
    name_resolver: Arc<dyn NameResolver>,
    data_handler: Arc<DataHandler>,
}

impl ArnsMiddleware {
    pub fn new(
        root_host: Option<String>,
        name_resolver: Arc<dyn NameResolver>,
        data_handler: Arc<DataHandler>,
    ) -> Self {
        Self {
            root_host,
            name_resolver,
            data_handler,
        }
    }
}

#[async_trait]
impl PipelineUnit<GatewayApp> for ArnsMiddleware {
    fn name(&self) -> &str {
        "arns"
    }

    async fn declare_capabilities(
        &self,
        registry: &CapabilityRegistry,
    ) -> Result<(), GatewayError> {
        registry.register(Capability::new("ArNs", "1.0.0"))
    }

    async fn apply(&self, app: GatewayApp) -> Result<GatewayApp, GatewayError> {
        Ok(app.stage(ArnsStage {
            root_host: self.root_host.as_ref().map(|h| h.to_ascii_lowercase()),
            name_resolver: self.name_resolver.clone(),
            data_handler: self.data_handler.clone(),
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request stage
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) struct ArnsStage {
    root_host: Option<String>,
    name_resolver: Arc<dyn NameResolver>,
    data_handler: Arc<DataHandler>,
}

#[async_trait]
impl RequestStage for ArnsStage {
    fn name(&self) -> &str {
        "arns"
    }

    async fn on_request(&self, req: &mut Request) -> Result<StageAction, GatewayError> {
        let Some(root_host) = &self.root_host else {
            return Ok(StageAction::Continue);
        };
        let Some(name) = request_subdomain(req, root_host) else {
            return Ok(StageAction::Continue);
        };
        if EXCLUDED_SUBDOMAINS.contains(&name.as_str()) {
            return Ok(StageAction::Continue);
        }
        // Avoid collisions with sandbox URLs by ensuring the subdomain length
        // is below the minimum length of a sandbox subdomain. Undernames are
        // an exception because they can be longer and '_' cannot appear in
        // base32.
        if name.len() > MAX_ARNS_NAME_LENGTH && !name.contains('_') {
            return Ok(StageAction::Continue);
        }

        let resolution = self.name_resolver.resolve(&name).await?;
        let Some(resolved_id) = resolution.resolved_id else {
            debug!(name = %name, "ArNS name did not resolve");
            return Ok(StageAction::Respond(send_not_found()));
        };

        let sub_path = req.uri().path().trim_start_matches('/').to_string();
        let mut resp = self.data_handler.handle(&resolved_id, &sub_path).await;
        let headers = resp.headers_mut();
        if let Ok(value) = HeaderValue::from_str(resolved_id.as_str()) {
            headers.insert("x-arns-resolved-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&resolution.ttl.to_string()) {
            headers.insert("x-arns-ttl-seconds", value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", resolution.ttl)) {
            headers.insert(header::CACHE_CONTROL, value);
        }
        Ok(StageAction::Respond(resp))
    }
}
