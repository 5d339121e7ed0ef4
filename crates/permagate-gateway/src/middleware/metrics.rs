//! Request metrics middleware.
//!
//! Records `http_requests_total{method,status}` and a latency histogram on a
//! private prometheus registry, serves the text exposition at
//! `GET /ar-io/__gateway_metrics`, and doubles as the structured access log
//! on the response path.

use crate::app::GatewayApp;
use crate::stage::{RequestStage, StageAction, StageParts};
use async_trait::async_trait;
use axum::extract::Request;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Router, routing::get};
use permagate_kernel::{Capability, CapabilityRegistry, GatewayError, PipelineUnit};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::{error, info};

/// Declares `gateway-metrics`, installs the recording stage, and serves the
/// exposition endpoint.
pub struct MetricsMiddleware {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
}

impl MetricsMiddleware {
    pub fn new() -> Self {
        let registry = Registry::new();
        let requests_total = IntCounterVec::new(
            Opts::new(
                "http_requests_total",
                "Total HTTP requests handled by the gateway",
            ),
            &["method", "status"],
        )
        .expect("valid counter spec");
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request latency in seconds",
            ),
            &["method"],
        )
        .expect("valid histogram spec");
        registry
            .register(Box::new(requests_total.clone()))
            .expect("fresh registry");
        registry
            .register(Box::new(request_duration.clone()))
            .expect("fresh registry");
        Self {
            registry,
            requests_total,
            request_duration,
        }
    }
}

impl Default for MetricsMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PipelineUnit<GatewayApp> for MetricsMiddleware {
    fn name(&self) -> &str {
        "metrics"
    }

    async fn declare_capabilities(
        &self,
        registry: &CapabilityRegistry,
    ) -> Result<(), GatewayError> {
        registry.register(Capability::new("gateway-metrics", "1.0.0"))
    }

    async fn apply(&self, app: GatewayApp) -> Result<GatewayApp, GatewayError> {
        let registry = self.registry.clone();
        let router = Router::new().route(
            "/ar-io/__gateway_metrics",
            get(move || {
                let registry = registry.clone();
                async move {
                    let mut buffer = Vec::new();
                    let encoder = TextEncoder::new();
                    if encoder.encode(&registry.gather(), &mut buffer).is_err() {
                        return (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed")
                            .into_response();
                    }
                    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], buffer)
                        .into_response()
                }
            }),
        );
        Ok(app.merge(router).stage(MetricsStage {
            requests_total: self.requests_total.clone(),
            request_duration: self.request_duration.clone(),
        }))
    }
}

struct MetricsStage {
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
}

#[async_trait]
impl RequestStage for MetricsStage {
    fn name(&self) -> &str {
        "metrics"
    }

    async fn on_request(&self, _req: &mut Request) -> Result<StageAction, GatewayError> {
        Ok(StageAction::Continue)
    }

    async fn on_response(
        &self,
        parts: &StageParts,
        resp: &mut Response,
    ) -> Result<(), GatewayError> {
        let elapsed = parts.received_at.elapsed().as_secs_f64();
        let method = parts.method.as_str();
        let status = resp.status();
        self.requests_total
            .with_label_values(&[method, status.as_str()])
            .inc();
        self.request_duration
            .with_label_values(&[method])
            .observe(elapsed);

        if status.is_server_error() {
            error!(
                method,
                path = parts.uri.path(),
                status = status.as_u16(),
                latency_s = elapsed,
                "request failed"
            );
        } else {
            info!(
                method,
                path = parts.uri.path(),
                status = status.as_u16(),
                latency_s = elapsed,
                "request served"
            );
        }
        Ok(())
    }
}
