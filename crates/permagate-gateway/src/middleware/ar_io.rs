//! Gateway info endpoints and the admin control plane.
//!
//! | Method | Path | Auth | Description |
//! |--------|------|------|-------------|
//! | `GET`  | `/ar-io/healthcheck` | none | Uptime, greeting, server date. |
//! | `GET`  | `/ar-io/info` | none | Operator wallet identifier. |
//! | `GET`  | `/ar-io/admin/debug` | bearer | Data-index diagnostics. |
//! | `PUT`  | `/ar-io/admin/block-data` | bearer | Blocklist an id or hash. |
//! | `POST` | `/ar-io/admin/queue-tx` | bearer | Priority-queue a transaction. |
//!
//! Admin authentication is a constant-path comparison of the full
//! `Authorization` header against `Bearer {ADMIN_API_KEY}` — one shared
//! secret, no per-operator credentials.

use crate::app::GatewayApp;
use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router, middleware};
use chrono::Utc;
use dashmap::DashSet;
use permagate_kernel::{
    BlockDataEntry, Capability, CapabilityRegistry, ContentId, ContiguousDataIndex, GatewayError,
    PipelineUnit, TransactionFetcher,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

// ─────────────────────────────────────────────────────────────────────────────
// Core info unit
// ─────────────────────────────────────────────────────────────────────────────

/// Declares `gateway-ar-core` and registers the public info endpoints.
pub struct ArIoCoreMiddleware {
    wallet: String,
    started_at: Instant,
}

impl ArIoCoreMiddleware {
    pub fn new(wallet: String) -> Self {
        Self {
            wallet,
            started_at: Instant::now(),
        }
    }
}

#[async_trait]
impl PipelineUnit<GatewayApp> for ArIoCoreMiddleware {
    fn name(&self) -> &str {
        "ar-io-core"
    }

    async fn declare_capabilities(
        &self,
        registry: &CapabilityRegistry,
    ) -> Result<(), GatewayError> {
        registry.register(Capability::new("gateway-ar-core", "1.0.0"))
    }

    async fn apply(&self, app: GatewayApp) -> Result<GatewayApp, GatewayError> {
        let started_at = self.started_at;
        let wallet = self.wallet.clone();
        let router = Router::new()
            .route(
                "/ar-io/healthcheck",
                get(move || async move {
                    Json(json!({
                        "uptime": started_at.elapsed().as_secs_f64(),
                        "message": "Welcome to the Permaweb.",
                        "date": Utc::now().to_rfc3339(),
                    }))
                }),
            )
            .route(
                "/ar-io/info",
                get(move || async move { Json(json!({ "wallet": wallet })) }),
            );
        Ok(app.merge(router))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin unit
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct AdminState {
    admin_api_key: String,
    data_index: Arc<dyn ContiguousDataIndex>,
    prioritized_tx_ids: Arc<DashSet<String>>,
    tx_fetcher: Arc<dyn TransactionFetcher>,
}

/// Declares `ar-io-admin` and nests the bearer-authenticated control plane.
pub struct ArIoAdminMiddleware {
    state: AdminState,
}

impl ArIoAdminMiddleware {
    pub fn new(
        admin_api_key: String,
        data_index: Arc<dyn ContiguousDataIndex>,
        prioritized_tx_ids: Arc<DashSet<String>>,
        tx_fetcher: Arc<dyn TransactionFetcher>,
    ) -> Self {
        Self {
            state: AdminState {
                admin_api_key,
                data_index,
                prioritized_tx_ids,
                tx_fetcher,
            },
        }
    }
}

#[async_trait]
impl PipelineUnit<GatewayApp> for ArIoAdminMiddleware {
    fn name(&self) -> &str {
        "ar-io-admin"
    }

    async fn declare_capabilities(
        &self,
        registry: &CapabilityRegistry,
    ) -> Result<(), GatewayError> {
        registry.register(Capability::new("ar-io-admin", "1.0.0"))
    }

    async fn apply(&self, app: GatewayApp) -> Result<GatewayApp, GatewayError> {
        let state = self.state.clone();
        let admin = Router::new()
            .route("/debug", get(debug_handler))
            .route("/block-data", put(block_data_handler))
            .route("/queue-tx", post(queue_tx_handler))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                require_admin_key,
            ))
            .with_state(state);
        Ok(app.nest("/ar-io/admin", admin))
    }
}

/// Gate every admin route on an exact bearer match.
async fn require_admin_key(
    State(state): State<AdminState>,
    req: Request,
    next: Next,
) -> Response {
    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {}", state.admin_api_key));
    if authorized {
        next.run(req).await
    } else {
        (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for PUT /ar-io/admin/block-data
#[derive(Debug, Deserialize)]
struct BlockDataRequest {
    id: Option<String>,
    hash: Option<String>,
    source: Option<String>,
    notes: Option<String>,
}

/// Request body for POST /ar-io/admin/queue-tx
#[derive(Debug, Deserialize)]
struct QueueTxRequest {
    id: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /ar-io/admin/debug — data-index diagnostic snapshot.
async fn debug_handler(State(state): State<AdminState>) -> Response {
    match state.data_index.get_debug_info().await {
        Ok(info) => Json(json!({ "db": info })).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

/// PUT /ar-io/admin/block-data — block contiguous data by id or hash.
///
/// The acknowledgement is fixed and does not verify the downstream write
/// outcome; the collaborator's error path is the only feedback.
async fn block_data_handler(
    State(state): State<AdminState>,
    Json(body): Json<BlockDataRequest>,
) -> Response {
    if body.id.is_none() && body.hash.is_none() {
        return (StatusCode::BAD_REQUEST, "Must provide 'id' or 'hash'").into_response();
    }
    let id = match body.id {
        Some(raw) => match raw.parse::<ContentId>() {
            Ok(id) => Some(id),
            Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
        },
        None => None,
    };
    let entry = BlockDataEntry {
        id,
        hash: body.hash,
        source: body.source,
        notes: body.notes,
    };
    match state.data_index.block_data(entry).await {
        Ok(()) => {
            info!("admin blocked content");
            Json(json!({ "message": "Content blocked" })).into_response()
        }
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

/// POST /ar-io/admin/queue-tx — add a transaction to the prioritized-fetch
/// set and hand it to the fetch worker.
async fn queue_tx_handler(
    State(state): State<AdminState>,
    Json(body): Json<QueueTxRequest>,
) -> Response {
    let Some(raw) = body.id else {
        return (StatusCode::BAD_REQUEST, "Must provide 'id'").into_response();
    };
    let id = match raw.parse::<ContentId>() {
        Ok(id) => id,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };
    state.prioritized_tx_ids.insert(id.as_str().to_string());
    match state.tx_fetcher.queue_tx_id(id).await {
        Ok(()) => {
            info!("admin queued transaction");
            Json(json!({ "message": "TX queued" })).into_response()
        }
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}
