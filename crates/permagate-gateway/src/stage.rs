//! Request-stage pipeline.
//!
//! A [`RequestStage`] is one link in the ordered chain every inbound request
//! passes through before axum route matching:
//!
//! ```text
//! Request  ──► metrics ──► sandbox ──► arns ──► (router / content fallback)
//! Response ◄── metrics ◄─────────────────────────────────┘
//! ```
//!
//! Stages run in list order on the request path and may short-circuit with a
//! full response (sandbox redirect, ArNS 404, ArNS-dispatched content).
//! Response hooks run in reverse order over whatever response was produced,
//! including short-circuited ones.

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode, Uri, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use permagate_kernel::GatewayError;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Stage contract
// ─────────────────────────────────────────────────────────────────────────────

/// Instruction returned by [`RequestStage::on_request`].
pub enum StageAction {
    /// Pass the (possibly modified) request to the next stage or the router.
    Continue,
    /// Short-circuit the chain with this response.
    Respond(Response),
}

/// Immutable request facts snapshotted before the chain runs, available to
/// response hooks after the request itself has been consumed by the router.
pub struct StageParts {
    pub method: Method,
    pub uri: Uri,
    pub received_at: Instant,
}

/// A single stage in the request pipeline.
///
/// Implementations must be `Send + Sync` so they can be shared across Tokio
/// tasks without additional synchronization by the caller.
#[async_trait]
pub trait RequestStage: Send + Sync {
    /// Stable, human-readable identifier for this stage (used in logs).
    fn name(&self) -> &str;

    /// Called before route matching. Errors surface as 500 to the client.
    async fn on_request(&self, req: &mut Request) -> Result<StageAction, GatewayError>;

    /// Called with the outbound response, in reverse stage order.
    async fn on_response(
        &self,
        parts: &StageParts,
        resp: &mut Response,
    ) -> Result<(), GatewayError> {
        let _ = (parts, resp);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered list of stages executed around the inner router.
pub struct StagePipeline {
    stages: Vec<Arc<dyn RequestStage>>,
}

impl StagePipeline {
    pub fn new(stages: Vec<Arc<dyn RequestStage>>) -> Self {
        Self { stages }
    }

    /// Run the chain: request hooks in order, inner router unless a stage
    /// responded, then response hooks in reverse for every stage that ran.
    pub async fn run(&self, mut req: Request, next: Next) -> Response {
        let parts = StageParts {
            method: req.method().clone(),
            uri: req.uri().clone(),
            received_at: Instant::now(),
        };

        let mut ran = 0usize;
        let mut short_circuit: Option<Response> = None;
        for stage in &self.stages {
            match stage.on_request(&mut req).await {
                Ok(StageAction::Continue) => ran += 1,
                Ok(StageAction::Respond(resp)) => {
                    ran += 1;
                    short_circuit = Some(resp);
                    break;
                }
                Err(err) => {
                    error!(stage = stage.name(), error = %err, "request stage failed");
                    short_circuit =
                        Some((StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response());
                    break;
                }
            }
        }

        let mut resp = match short_circuit {
            Some(resp) => resp,
            None => next.run(req).await,
        };

        for stage in self.stages[..ran].iter().rev() {
            if let Err(err) = stage.on_response(&parts, &mut resp).await {
                warn!(stage = stage.name(), error = %err, "response stage failed");
            }
        }
        resp
    }
}

/// axum middleware entry point wired by [`GatewayApp::finalize`](crate::app::GatewayApp::finalize).
pub async fn run_pipeline(
    State(pipeline): State<Arc<StagePipeline>>,
    req: Request,
    next: Next,
) -> Response {
    pipeline.run(req, next).await
}

// ─────────────────────────────────────────────────────────────────────────────
// Host helpers shared by the sandbox and ArNS stages
// ─────────────────────────────────────────────────────────────────────────────

/// Request host, lowercased, with any port stripped.
pub(crate) fn request_host(req: &Request) -> Option<String> {
    req.headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().host())
        .map(|host| {
            host.split(':')
                .next()
                .unwrap_or(host)
                .to_ascii_lowercase()
        })
}

/// The single label below `root_host`, when the request host has exactly one.
pub(crate) fn request_subdomain(req: &Request, root_host: &str) -> Option<String> {
    let host = request_host(req)?;
    let label = host.strip_suffix(&format!(".{}", root_host.to_ascii_lowercase()))?;
    if label.is_empty() || label.contains('.') {
        return None;
    }
    Some(label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(host: &str) -> Request {
        Request::builder()
            .uri("/")
            .header("host", host)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn host_is_lowercased_and_unported() {
        let req = request("Gateway.Example:4000");
        assert_eq!(request_host(&req), Some("gateway.example".to_string()));
    }

    #[test]
    fn subdomain_requires_exactly_one_label() {
        assert_eq!(
            request_subdomain(&request("name.gateway.example"), "gateway.example"),
            Some("name".to_string())
        );
        assert_eq!(
            request_subdomain(&request("gateway.example"), "gateway.example"),
            None
        );
        assert_eq!(
            request_subdomain(&request("a.b.gateway.example"), "gateway.example"),
            None
        );
        assert_eq!(
            request_subdomain(&request("unrelated.example"), "gateway.example"),
            None
        );
    }
}
