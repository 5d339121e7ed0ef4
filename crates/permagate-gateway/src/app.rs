//! The in-progress application object threaded through the pipeline.
//!
//! [`GatewayApp`] is what a [`PipelineUnit`](permagate_kernel::PipelineUnit)
//! receives in phase 2: an axum [`Router`] for endpoint registration plus an
//! ordered list of [`RequestStage`]s that will run ahead of route matching.
//! Ownership passes through each unit in turn — the app is never aliased
//! during assembly. [`finalize`](GatewayApp::finalize) wires the stage
//! pipeline around the router as a single middleware layer.

use crate::stage::{RequestStage, StagePipeline, run_pipeline};
use axum::Router;
use axum::handler::Handler;
use axum::routing::MethodRouter;
use std::sync::Arc;

/// Builder for the final HTTP application.
#[derive(Default)]
pub struct GatewayApp {
    router: Router,
    stages: Vec<Arc<dyn RequestStage>>,
}

impl GatewayApp {
    /// Start with an empty router and no stages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route on the inner router.
    pub fn route(mut self, path: &str, method_router: MethodRouter) -> Self {
        self.router = self.router.route(path, method_router);
        self
    }

    /// Merge a pre-built router (endpoint groups built by one unit).
    pub fn merge(mut self, other: Router) -> Self {
        self.router = self.router.merge(other);
        self
    }

    /// Nest a router under a path prefix.
    pub fn nest(mut self, path: &str, router: Router) -> Self {
        self.router = self.router.nest(path, router);
        self
    }

    /// Install the router fallback (at most one unit may do this).
    pub fn fallback<H, T>(mut self, handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.router = self.router.fallback(handler);
        self
    }

    /// Append a request stage. Stages run in append order on every request,
    /// before route matching.
    pub fn stage(mut self, stage: impl RequestStage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Produce the servable router: the inner router wrapped by the stage
    /// pipeline.
    pub fn finalize(self) -> Router {
        let pipeline = Arc::new(StagePipeline::new(self.stages));
        self.router
            .layer(axum::middleware::from_fn_with_state(pipeline, run_pipeline))
    }
}
