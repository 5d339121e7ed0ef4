//! Collaborator contracts — the boundary to everything the core does not do.
//!
//! The gateway core never fetches, hashes, caches, or persists anything
//! itself. Each concern is reached through one of the traits below;
//! implementations (SQLite indexes, chain clients, caching fetchers …) live
//! in separate crates or services and are injected at assembly time.
//!
//! Calls are best-effort: the core performs no retries and reports failures
//! straight back to the client (404 or 500 depending on the call site).

use crate::error::GatewayError;
use crate::id::ContentId;
use crate::types::{
    BlockDataEntry, ContiguousData, DataAttributes, ManifestResolution, NameResolution,
};
use async_trait::async_trait;

/// Resolves human-readable ArNS names to content identifiers.
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Resolve `name` to an identifier and TTL. A name that does not map to
    /// content resolves with `resolved_id: None` — that is not an error.
    async fn resolve(&self, name: &str) -> Result<NameResolution, GatewayError>;
}

/// Retrieves the bytes of a piece of contiguous data.
#[async_trait]
pub trait ContiguousDataSource: Send + Sync {
    /// Fetch the full content addressed by `id`.
    async fn get_data(&self, id: &ContentId) -> Result<ContiguousData, GatewayError>;
}

/// Index of contiguous-data attributes, doubling as the admin control-plane
/// target (the production index owns both the lookup tables and the
/// blocklist/diagnostic state).
#[async_trait]
pub trait ContiguousDataIndex: Send + Sync {
    /// Look up indexed attributes for `id`. `None` when the id is unknown.
    async fn get_data_attributes(
        &self,
        id: &ContentId,
    ) -> Result<Option<DataAttributes>, GatewayError>;

    /// Diagnostic snapshot served by the admin debug endpoint.
    async fn get_debug_info(&self) -> Result<serde_json::Value, GatewayError>;

    /// Record a blocklist entry. The caller has already validated the
    /// id-or-hash invariant.
    async fn block_data(&self, entry: BlockDataEntry) -> Result<(), GatewayError>;
}

/// Read side of the blocklist consulted before any content is served.
#[async_trait]
pub trait BlockListValidator: Send + Sync {
    /// `true` when the identifier itself is blocked.
    async fn is_id_blocked(&self, id: &ContentId) -> Result<bool, GatewayError>;

    /// `true` when the content hash is blocked.
    async fn is_hash_blocked(&self, hash: &str) -> Result<bool, GatewayError>;
}

/// Resolves manifest-relative sub-paths to content identifiers.
#[async_trait]
pub trait ManifestPathResolver: Send + Sync {
    /// Resolve `path` (empty string for the manifest index) within the
    /// manifest addressed by `manifest_id`.
    async fn resolve_path(
        &self,
        manifest_id: &ContentId,
        path: &str,
    ) -> Result<ManifestResolution, GatewayError>;
}

/// Expedited-retrieval worker fed by the admin control plane.
#[async_trait]
pub trait TransactionFetcher: Send + Sync {
    /// Enqueue `id` for priority fetching.
    async fn queue_tx_id(&self, id: ContentId) -> Result<(), GatewayError>;
}
