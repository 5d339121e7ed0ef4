//! Content route handlers and path-shape dispatch.
//!
//! Two path shapes exist, matched by compiled patterns (case-insensitive,
//! exact 43-character identifier charset):
//!
//! - `/raw/{id}` — raw bytes, no manifest interpretation
//! - `/{id}` or `/{id}/{subpath}` — manifest-aware
//!
//! Both handlers consult the blocklist (by id and by indexed content hash)
//! before serving. Anything unservable is a plain 404; collaborator failures
//! other than a missed fetch surface as 500.

use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use lazy_static::lazy_static;
use permagate_kernel::{
    BlockListValidator, ContentId, ContiguousDataIndex, ContiguousDataSource, DataAttributes,
    GatewayError, ManifestPathResolver,
};
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, error};

lazy_static! {
    static ref RAW_DATA_PATH_REGEX: Regex =
        Regex::new(r"(?i)^/raw/([a-zA-Z0-9_-]{43})/?$").expect("valid raw data path pattern");
    static ref DATA_PATH_REGEX: Regex =
        Regex::new(r"(?i)^/?([a-zA-Z0-9_-]{43})/?$|^/?([a-zA-Z0-9_-]{43})/(.*)$")
            .expect("valid data path pattern");
}

/// 404 response shared by every unservable-content path.
pub(crate) fn send_not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

fn internal_error(err: &GatewayError) -> Response {
    error!(error = %err, "content handler failed");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

/// Router fallback: pattern-match the path into raw vs. manifest-relative
/// content requests. Unmatched paths are 404 — nothing routes after this.
pub(crate) async fn dispatch(
    req: Request,
    data_handler: Arc<DataHandler>,
    raw_handler: Arc<RawDataHandler>,
) -> Response {
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return send_not_found();
    }
    let path = req.uri().path().to_string();

    if let Some(captures) = RAW_DATA_PATH_REGEX.captures(&path) {
        return match captures[1].parse::<ContentId>() {
            Ok(id) => raw_handler.handle(&id).await,
            Err(_) => send_not_found(),
        };
    }

    if let Some(captures) = DATA_PATH_REGEX.captures(&path) {
        let (id_str, sub_path) = match (captures.get(1), captures.get(2)) {
            (Some(bare), _) => (bare.as_str(), ""),
            (None, Some(id)) => (
                id.as_str(),
                captures.get(3).map(|m| m.as_str()).unwrap_or(""),
            ),
            _ => return send_not_found(),
        };
        return match id_str.parse::<ContentId>() {
            Ok(id) => data_handler.handle(&id, sub_path).await,
            Err(_) => send_not_found(),
        };
    }

    send_not_found()
}

// ─────────────────────────────────────────────────────────────────────────────
// Manifest-aware handler
// ─────────────────────────────────────────────────────────────────────────────

/// Serves addressed content, resolving sub-paths through the manifest
/// collaborator when the identifier addresses a manifest.
pub struct DataHandler {
    data_index: Arc<dyn ContiguousDataIndex>,
    data_source: Arc<dyn ContiguousDataSource>,
    block_list_validator: Arc<dyn BlockListValidator>,
    manifest_path_resolver: Arc<dyn ManifestPathResolver>,
}

impl DataHandler {
    pub fn new(
        data_index: Arc<dyn ContiguousDataIndex>,
        data_source: Arc<dyn ContiguousDataSource>,
        block_list_validator: Arc<dyn BlockListValidator>,
        manifest_path_resolver: Arc<dyn ManifestPathResolver>,
    ) -> Self {
        Self {
            data_index,
            data_source,
            block_list_validator,
            manifest_path_resolver,
        }
    }

    /// Serve `id` (or the manifest entry at `sub_path` within it).
    pub async fn handle(&self, id: &ContentId, sub_path: &str) -> Response {
        match self.try_handle(id, sub_path).await {
            Ok(resp) => resp,
            Err(err) => internal_error(&err),
        }
    }

    async fn try_handle(&self, id: &ContentId, sub_path: &str) -> Result<Response, GatewayError> {
        if self.is_blocked(id).await? {
            return Ok(send_not_found());
        }
        let attributes = self.data_index.get_data_attributes(id).await?;
        if self.is_hash_blocked(&attributes).await? {
            return Ok(send_not_found());
        }

        let is_manifest = attributes.as_ref().is_some_and(|a| a.is_manifest);
        if !is_manifest {
            // Sub-paths only make sense under a manifest.
            if !sub_path.is_empty() {
                return Ok(send_not_found());
            }
            return serve(&self.data_source, id, attributes).await;
        }

        let resolution = self.manifest_path_resolver.resolve_path(id, sub_path).await?;
        let Some(resolved) = resolution.resolved_id else {
            return Ok(send_not_found());
        };
        if self.is_blocked(&resolved).await? {
            return Ok(send_not_found());
        }
        let resolved_attributes = self.data_index.get_data_attributes(&resolved).await?;
        if self.is_hash_blocked(&resolved_attributes).await? {
            return Ok(send_not_found());
        }
        serve(&self.data_source, &resolved, resolved_attributes).await
    }

    async fn is_blocked(&self, id: &ContentId) -> Result<bool, GatewayError> {
        self.block_list_validator.is_id_blocked(id).await
    }

    async fn is_hash_blocked(
        &self,
        attributes: &Option<DataAttributes>,
    ) -> Result<bool, GatewayError> {
        match attributes.as_ref().and_then(|a| a.hash.as_deref()) {
            Some(hash) => self.block_list_validator.is_hash_blocked(hash).await,
            None => Ok(false),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Raw handler
// ─────────────────────────────────────────────────────────────────────────────

/// Serves raw content bytes. Holds no manifest resolver at all — raw
/// requests bypass manifest interpretation entirely.
pub struct RawDataHandler {
    data_index: Arc<dyn ContiguousDataIndex>,
    data_source: Arc<dyn ContiguousDataSource>,
    block_list_validator: Arc<dyn BlockListValidator>,
}

impl RawDataHandler {
    pub fn new(
        data_index: Arc<dyn ContiguousDataIndex>,
        data_source: Arc<dyn ContiguousDataSource>,
        block_list_validator: Arc<dyn BlockListValidator>,
    ) -> Self {
        Self {
            data_index,
            data_source,
            block_list_validator,
        }
    }

    pub async fn handle(&self, id: &ContentId) -> Response {
        match self.try_handle(id).await {
            Ok(resp) => resp,
            Err(err) => internal_error(&err),
        }
    }

    async fn try_handle(&self, id: &ContentId) -> Result<Response, GatewayError> {
        if self.block_list_validator.is_id_blocked(id).await? {
            return Ok(send_not_found());
        }
        let attributes = self.data_index.get_data_attributes(id).await?;
        if let Some(hash) = attributes.as_ref().and_then(|a| a.hash.as_deref()) {
            if self.block_list_validator.is_hash_blocked(hash).await? {
                return Ok(send_not_found());
            }
        }
        serve(&self.data_source, id, attributes).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared serving tail
// ─────────────────────────────────────────────────────────────────────────────

async fn serve(
    data_source: &Arc<dyn ContiguousDataSource>,
    id: &ContentId,
    attributes: Option<DataAttributes>,
) -> Result<Response, GatewayError> {
    let data = match data_source.get_data(id).await {
        Ok(data) => data,
        Err(err) => {
            debug!(id = %id, error = %err, "data fetch failed");
            return Ok(send_not_found());
        }
    };
    let content_type = data
        .content_type
        .clone()
        .or_else(|| attributes.and_then(|a| a.content_type))
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let mut resp = (StatusCode::OK, Body::from(data.data)).into_response();
    if let Ok(value) = HeaderValue::from_str(&content_type) {
        resp.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::{
        InMemoryDataIndex, InMemoryDataSource, InMemoryManifestPathResolver,
    };
    use http_body_util::BodyExt;
    use permagate_kernel::BlockDataEntry;

    const TX_ID: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
    const MANIFEST_ID: &str = "BBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";
    const TARGET_ID: &str = "CCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCC";

    struct Fixture {
        index: Arc<InMemoryDataIndex>,
        source: Arc<InMemoryDataSource>,
        manifests: Arc<InMemoryManifestPathResolver>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                index: Arc::new(InMemoryDataIndex::new()),
                source: Arc::new(InMemoryDataSource::new()),
                manifests: Arc::new(InMemoryManifestPathResolver::new()),
            }
        }

        fn data_handler(&self) -> DataHandler {
            DataHandler::new(
                self.index.clone(),
                self.source.clone(),
                self.index.clone(),
                self.manifests.clone(),
            )
        }

        fn raw_handler(&self) -> RawDataHandler {
            RawDataHandler::new(self.index.clone(), self.source.clone(), self.index.clone())
        }
    }

    async fn body_of(resp: Response) -> Vec<u8> {
        resp.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[test]
    fn path_patterns_match_the_two_shapes() {
        assert!(RAW_DATA_PATH_REGEX.is_match(&format!("/raw/{TX_ID}")));
        assert!(RAW_DATA_PATH_REGEX.is_match(&format!("/raw/{TX_ID}/")));
        assert!(!RAW_DATA_PATH_REGEX.is_match(&format!("/raw/{TX_ID}/x")));
        assert!(DATA_PATH_REGEX.is_match(&format!("/{TX_ID}")));
        assert!(DATA_PATH_REGEX.is_match(&format!("/{TX_ID}/deep/path.html")));
        assert!(!DATA_PATH_REGEX.is_match("/not-an-id"));
    }

    #[tokio::test]
    async fn serves_plain_data_with_content_type() {
        let fx = Fixture::new();
        let id: ContentId = TX_ID.parse().unwrap();
        fx.source.insert(&id, b"hello".to_vec(), Some("text/plain"));

        let resp = fx.data_handler().handle(&id, "").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain"
        );
        assert_eq!(body_of(resp).await, b"hello");
    }

    #[tokio::test]
    async fn missing_data_is_404() {
        let fx = Fixture::new();
        let id: ContentId = TX_ID.parse().unwrap();
        let resp = fx.data_handler().handle(&id, "").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn sub_path_under_non_manifest_is_404() {
        let fx = Fixture::new();
        let id: ContentId = TX_ID.parse().unwrap();
        fx.source.insert(&id, b"hello".to_vec(), None);

        let resp = fx.data_handler().handle(&id, "sub/path").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn manifest_sub_path_resolves_and_serves_target() {
        let fx = Fixture::new();
        let manifest: ContentId = MANIFEST_ID.parse().unwrap();
        let target: ContentId = TARGET_ID.parse().unwrap();
        fx.index.insert_attributes(
            &manifest,
            DataAttributes {
                is_manifest: true,
                ..Default::default()
            },
        );
        fx.manifests.insert(&manifest, "index.html", target.clone());
        fx.source
            .insert(&target, b"<html/>".to_vec(), Some("text/html"));

        let resp = fx.data_handler().handle(&manifest, "index.html").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_of(resp).await, b"<html/>");
    }

    #[tokio::test]
    async fn unmapped_manifest_path_is_404() {
        let fx = Fixture::new();
        let manifest: ContentId = MANIFEST_ID.parse().unwrap();
        fx.index.insert_attributes(
            &manifest,
            DataAttributes {
                is_manifest: true,
                ..Default::default()
            },
        );

        let resp = fx.data_handler().handle(&manifest, "missing.html").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn blocked_id_is_never_served() {
        let fx = Fixture::new();
        let id: ContentId = TX_ID.parse().unwrap();
        fx.source.insert(&id, b"bytes".to_vec(), None);
        fx.index
            .block_data(BlockDataEntry {
                id: Some(id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(
            fx.data_handler().handle(&id, "").await.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            fx.raw_handler().handle(&id).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn blocked_hash_is_never_served() {
        let fx = Fixture::new();
        let id: ContentId = TX_ID.parse().unwrap();
        fx.source.insert(&id, b"bytes".to_vec(), None);
        fx.index.insert_attributes(
            &id,
            DataAttributes {
                hash: Some("h0".to_string()),
                ..Default::default()
            },
        );
        fx.index
            .block_data(BlockDataEntry {
                hash: Some("h0".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(
            fx.raw_handler().handle(&id).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn raw_requests_never_touch_the_manifest_resolver() {
        let fx = Fixture::new();
        let manifest: ContentId = MANIFEST_ID.parse().unwrap();
        fx.index.insert_attributes(
            &manifest,
            DataAttributes {
                is_manifest: true,
                ..Default::default()
            },
        );
        fx.source.insert(&manifest, b"{}".to_vec(), None);

        let resp = fx.raw_handler().handle(&manifest).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(fx.manifests.resolution_count(), 0);
    }
}
