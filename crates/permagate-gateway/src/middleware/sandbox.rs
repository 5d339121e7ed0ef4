//! Sandbox-isolation middleware.
//!
//! Pins each content identifier to one canonical subdomain — the lowercase,
//! unpadded base32 encoding of its decoded bytes — and 302-redirects any
//! request arriving on a different host. This keeps content served for one
//! identifier from executing script in a browsing context that could read
//! cookies or storage scoped to another identifier.

use crate::app::GatewayApp;
use crate::stage::{RequestStage, StageAction, request_subdomain};
use async_trait::async_trait;
use axum::extract::Request;
use axum::http::uri::Scheme;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use lazy_static::lazy_static;
use permagate_kernel::{Capability, CapabilityRegistry, ContentId, GatewayError, PipelineUnit};
use regex::Regex;

lazy_static! {
    static ref LEADING_ID_REGEX: Regex =
        Regex::new(r"^/([a-zA-Z0-9_-]{43})").expect("valid leading id pattern");
}

/// Candidate identifier from the first path segment, if any.
fn request_id(path: &str) -> Option<ContentId> {
    LEADING_ID_REGEX
        .captures(path)
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn request_is_secure(req: &Request) -> bool {
    req.uri().scheme() == Some(&Scheme::HTTPS)
        || req
            .headers()
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
}

fn redirect_found(location: &str) -> Response {
    let mut resp = StatusCode::FOUND.into_response();
    if let Ok(value) = HeaderValue::from_str(location) {
        resp.headers_mut().insert(header::LOCATION, value);
    }
    resp
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline unit
// ─────────────────────────────────────────────────────────────────────────────

/// Declares the `sandbox` capability and installs the guard stage.
pub struct SandboxMiddleware {
    root_host: Option<String>,
    sandbox_protocol: Option<String>,
}

impl SandboxMiddleware {
    /// `root_host: None` disables sandboxing entirely. `sandbox_protocol`
    /// overrides the redirect scheme (normally derived from the request).
    pub fn new(root_host: Option<String>, sandbox_protocol: Option<String>) -> Self {
        Self {
            root_host,
            sandbox_protocol,
        }
    }
}

#[async_trait]
impl PipelineUnit<GatewayApp> for SandboxMiddleware {
    fn name(&self) -> &str {
        "sandbox"
    }

    async fn declare_capabilities(
        &self,
        registry: &CapabilityRegistry,
    ) -> Result<(), GatewayError> {
        registry.register(Capability::new("sandbox", "1.0.0"))
    }

    async fn apply(&self, app: GatewayApp) -> Result<GatewayApp, GatewayError> {
        Ok(app.stage(SandboxStage {
            root_host: self.root_host.as_ref().map(|h| h.to_ascii_lowercase()),
            sandbox_protocol: self.sandbox_protocol.clone(),
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request stage
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) struct SandboxStage {
    root_host: Option<String>,
    sandbox_protocol: Option<String>,
}

#[async_trait]
impl RequestStage for SandboxStage {
    fn name(&self) -> &str {
        "sandbox"
    }

    async fn on_request(&self, req: &mut Request) -> Result<StageAction, GatewayError> {
        let Some(root_host) = &self.root_host else {
            return Ok(StageAction::Continue);
        };
        let Some(id) = request_id(req.uri().path()) else {
            return Ok(StageAction::Continue);
        };

        let request_sandbox = request_subdomain(req, root_host);
        let id_sandbox = id.sandbox_label()?;
        if request_sandbox.as_deref() != Some(id_sandbox.as_str()) {
            let query = req.uri().query().unwrap_or("");
            let path = req.uri().path().replacen("//", "/", 1);
            let protocol = self.sandbox_protocol.clone().unwrap_or_else(|| {
                if request_is_secure(req) {
                    "https".to_string()
                } else {
                    "http".to_string()
                }
            });
            return Ok(StageAction::Respond(redirect_found(&format!(
                "{protocol}://{id_sandbox}.{root_host}{path}?{query}"
            ))));
        }

        Ok(StageAction::Continue)
    }
}
